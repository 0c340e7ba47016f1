//! Errors raised inside the memory subsystem.
//!
//! None of these reach the turn loop: the manager logs them and degrades to
//! empty results or in-memory state.

use thiserror::Error;

/// Errors from persistence and embedding operations.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Embedding backend unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),
}

/// Convenience alias used across the crate.
pub type MemoryResult<T> = Result<T, MemoryError>;
