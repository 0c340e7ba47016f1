//! Relevance ranking for long-term notes.
//!
//! Two interchangeable strategies sit behind [`Recall`]:
//! - [`LightweightRecall`]: priority plus keyword hits over recent notes
//! - [`SemanticRecall`]: embedding nearest-neighbour search
//!
//! The strategy is chosen once, at construction, by [`select_strategy`].
//! If semantic recall is requested but no embedder can be built, the
//! lightweight strategy is used instead and the reason is reported.

pub mod embedder;
mod lightweight;
mod semantic;

pub use embedder::{Embedder, LocalEmbedder, DEFAULT_EMBEDDING_MODEL};
pub use lightweight::LightweightRecall;
pub use semantic::SemanticRecall;

use crate::error::MemoryResult;
use crate::note::NoteRecord;
use std::fmt;
use tracing::{info, warn};

/// Which retrieval strategy is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecallMode {
    Lightweight,
    Semantic,
}

impl fmt::Display for RecallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecallMode::Lightweight => write!(f, "Lightweight"),
            RecallMode::Semantic => write!(f, "Semantic RAG"),
        }
    }
}

/// What to look for.
#[derive(Debug, Clone, Default)]
pub struct RecallQuery {
    /// Free text, usually the player's input.
    pub cue: String,
    /// Names to boost (lightweight strategy only).
    pub npc_focus: Vec<String>,
    /// Maximum number of results.
    pub k: usize,
}

impl RecallQuery {
    pub fn new(cue: impl Into<String>, k: usize) -> Self {
        Self {
            cue: cue.into(),
            npc_focus: Vec::new(),
            k,
        }
    }

    pub fn with_focus(mut self, npc_focus: Vec<String>) -> Self {
        self.npc_focus = npc_focus;
        self
    }
}

/// A retrieval strategy over the long-term store.
pub trait Recall {
    fn mode(&self) -> RecallMode;

    /// Make a newly stored note's text retrievable.
    fn index_note(&mut self, text: &str);

    /// Re-align any private index with the current store.
    fn rebuild(&mut self, notes: &[NoteRecord]);

    /// Up to `query.k` note texts, most relevant first.
    fn recall(&self, notes: &[NoteRecord], query: &RecallQuery) -> Vec<String>;
}

/// The chosen strategy plus why semantic recall was skipped, if it was.
pub struct StrategySelection {
    pub recall: Box<dyn Recall>,
    pub fallback_reason: Option<String>,
}

/// Build the recall strategy.
///
/// `embedder` is only invoked when `use_semantic` is set. Any error it
/// returns downgrades the selection to lightweight recall.
pub fn select_strategy<F>(
    use_semantic: bool,
    pool_size: usize,
    notes: &[NoteRecord],
    embedder: F,
) -> StrategySelection
where
    F: FnOnce() -> MemoryResult<Box<dyn Embedder>>,
{
    let lightweight = || Box::new(LightweightRecall::new(pool_size)) as Box<dyn Recall>;

    if !use_semantic {
        return StrategySelection {
            recall: lightweight(),
            fallback_reason: None,
        };
    }

    match embedder() {
        Ok(embedder) => {
            info!(model = embedder.model_name(), "Using semantic recall");
            StrategySelection {
                recall: Box::new(SemanticRecall::new(embedder, notes)),
                fallback_reason: None,
            }
        }
        Err(e) => {
            let reason = format!("Semantic recall requested but unavailable ({e}); falling back to Lightweight.");
            warn!("{reason}");
            StrategySelection {
                recall: lightweight(),
                fallback_reason: Some(reason),
            }
        }
    }
}
