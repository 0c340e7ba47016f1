//! File-backed JSON record store.
//!
//! Each persisted structure (long-term notes, keyword bank, consistency
//! hints) lives in its own file. Reads never fail: a missing or corrupt file
//! yields the caller's default. Writes overwrite the whole file.

use crate::error::MemoryResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the long-term note store.
pub const LONG_TERM_FILE: &str = "long_term_memory.json";

/// File name of the reserved keyword bank.
pub const KEYWORD_BANK_FILE: &str = "keyword_bank.json";

/// File name of the consistency hint queue.
pub const HINTS_FILE: &str = "consistency_hints.json";

/// A single JSON file holding one persisted structure.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Create a store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored value, or `default` if the file is missing or unreadable.
    pub fn load<T: DeserializeOwned>(&self, default: T) -> T {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return default,
        };

        match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable record file, using default");
                default
            }
        }
    }

    /// Overwrite the backing file with `value`.
    pub fn save<T: Serialize + ?Sized>(&self, value: &T) -> MemoryResult<()> {
        let content = serde_json::to_string_pretty(value)?;
        fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), "Saved records");
        Ok(())
    }

    /// Save, logging instead of propagating failures.
    pub fn save_or_warn<T: Serialize + ?Sized>(&self, value: &T) {
        if let Err(e) = self.save(value) {
            warn!(path = %self.path.display(), error = %e, "Failed to persist records");
        }
    }
}
