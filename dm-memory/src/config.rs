//! Memory manager configuration.

use crate::keywords::KeywordTables;
use crate::recall::DEFAULT_EMBEDDING_MODEL;
use std::path::PathBuf;

/// Configuration for a [`crate::MemoryManager`].
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Number of recent exchanges rendered as short-term context.
    pub short_window: usize,

    /// Request embedding-based recall (falls back if unavailable).
    pub use_semantic_rag: bool,

    /// Directory holding the persisted JSON files.
    pub data_dir: PathBuf,

    /// How many of the most recent notes lightweight recall considers.
    pub recall_pool: usize,

    /// How many notes a recap shows.
    pub recap_len: usize,

    /// How many hints are drained into each prompt.
    pub hint_batch: usize,

    /// Sentence-embedding model for semantic recall.
    pub embedding_model: String,

    /// Keyword tables used for extraction and scoring.
    pub keywords: KeywordTables,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            short_window: 5,
            use_semantic_rag: false,
            data_dir: PathBuf::from("data"),
            recall_pool: 200,
            recap_len: 12,
            hint_batch: 2,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            keywords: KeywordTables::default(),
        }
    }
}

impl MemoryConfig {
    /// Create a config with the given window size and recall mode.
    pub fn new(short_window: usize, use_semantic_rag: bool) -> Self {
        Self {
            short_window,
            use_semantic_rag,
            ..Self::default()
        }
    }

    /// Defaults overridden by `SHORT_WINDOW`, `USE_SEMANTIC_RAG`,
    /// `DM_DATA_DIR`, `EMBEDDING_MODEL` and `DM_KEYWORDS_FILE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(window) = env_var("SHORT_WINDOW").and_then(|v| v.trim().parse().ok()) {
            config.short_window = window;
        }
        if let Some(flag) = env_var("USE_SEMANTIC_RAG") {
            config.use_semantic_rag = parse_flag(&flag);
        }
        if let Some(dir) = env_var("DM_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(model) = env_var("EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        if let Some(path) = env_var("DM_KEYWORDS_FILE") {
            config.keywords = KeywordTables::load(path);
        }

        config
    }

    /// Set the short-term window size.
    pub fn with_short_window(mut self, short_window: usize) -> Self {
        self.short_window = short_window;
        self
    }

    /// Request or disable semantic recall.
    pub fn with_semantic_rag(mut self, enabled: bool) -> Self {
        self.use_semantic_rag = enabled;
        self
    }

    /// Set the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the embedding model name.
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Replace the keyword tables.
    pub fn with_keywords(mut self, keywords: KeywordTables) -> Self {
        self.keywords = keywords;
        self
    }
}

/// Interpret `1`, `true` and `yes` (any case) as enabled.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MemoryConfig::default();
        assert_eq!(config.short_window, 5);
        assert!(!config.use_semantic_rag);
        assert_eq!(config.recall_pool, 200);
        assert_eq!(config.recap_len, 12);
        assert_eq!(config.hint_batch, 2);
    }

    #[test]
    fn test_builder() {
        let config = MemoryConfig::new(4, true)
            .with_data_dir("/tmp/dm")
            .with_embedding_model("bge-small-en-v1.5");
        assert_eq!(config.short_window, 4);
        assert!(config.use_semantic_rag);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/dm"));
        assert_eq!(config.embedding_model, "bge-small-en-v1.5");
    }

    #[test]
    fn test_parse_flag() {
        for on in ["1", "true", "YES", " True "] {
            assert!(parse_flag(on), "{on}");
        }
        for off in ["0", "false", "no", "", "on"] {
            assert!(!parse_flag(off), "{off}");
        }
    }
}
