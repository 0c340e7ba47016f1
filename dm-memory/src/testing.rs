//! Testing utilities for the memory subsystem.
//!
//! - `MockEmbedder` for deterministic semantic recall without a model download
//! - `temp_config` for managers rooted in a throwaway data directory

use crate::config::MemoryConfig;
use crate::error::{MemoryError, MemoryResult};
use crate::recall::embedder::{normalize, Embedder};
use std::path::Path;

const MOCK_DIMENSION: usize = 256;

/// A bag-of-words hashing embedder.
///
/// Texts sharing words land close together, which is enough to exercise
/// ranking. Not suitable for real semantic search.
#[derive(Debug, Clone, Default)]
pub struct MockEmbedder {
    fail_on: Option<String>,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// An embedder that errors on any text containing `needle`.
    pub fn failing_on(needle: impl Into<String>) -> Self {
        Self {
            fail_on: Some(needle.into()),
        }
    }
}

impl Embedder for MockEmbedder {
    fn model_name(&self) -> &str {
        "mock-embedder"
    }

    fn embed(&self, text: &str) -> MemoryResult<Vec<f32>> {
        if let Some(needle) = &self.fail_on {
            if text.contains(needle.as_str()) {
                return Err(MemoryError::Embedding(format!("refusing to embed {text:?}")));
            }
        }

        let mut vector = vec![0.0f32; MOCK_DIMENSION];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            vector[bucket(token)] += 1.0;
        }
        normalize(&mut vector);
        Ok(vector)
    }
}

/// FNV-1a, folded into the mock dimension.
fn bucket(token: &str) -> usize {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in token.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    (hash % MOCK_DIMENSION as u64) as usize
}

/// A lightweight-mode config whose files live under `dir`.
pub fn temp_config(dir: impl AsRef<Path>) -> MemoryConfig {
    MemoryConfig::default().with_data_dir(dir.as_ref())
}
