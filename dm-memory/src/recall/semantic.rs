//! Embedding nearest-neighbour recall.

use super::embedder::{dot, normalize, Embedder};
use super::{Recall, RecallMode, RecallQuery};
use crate::note::NoteRecord;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Flat inner-product index over unit-normalized note embeddings.
///
/// `corpus[i]` is the text whose embedding is `vectors[i]`; the two always
/// have the same length.
pub struct SemanticRecall {
    embedder: Box<dyn Embedder>,
    corpus: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

impl SemanticRecall {
    /// Create an index seeded from the text of every existing note, in order.
    pub fn new(embedder: Box<dyn Embedder>, notes: &[NoteRecord]) -> Self {
        let mut recall = Self {
            embedder,
            corpus: Vec::new(),
            vectors: Vec::new(),
        };
        for note in notes {
            recall.add_text(&note.note);
        }
        debug!(
            model = recall.embedder.model_name(),
            indexed = recall.len(),
            "Seeded semantic index"
        );
        recall
    }

    /// Number of indexed texts.
    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    /// Indexed texts in insertion order.
    pub fn corpus(&self) -> &[String] {
        &self.corpus
    }

    fn embed(&self, text: &str) -> Option<Vec<f32>> {
        match self.embedder.embed(text) {
            Ok(mut vector) => {
                normalize(&mut vector);
                Some(vector)
            }
            Err(e) => {
                warn!(error = %e, "Embedding failed");
                None
            }
        }
    }

    fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(vector) = self.embed(text) {
            self.corpus.push(text.to_string());
            self.vectors.push(vector);
        }
    }

    /// Up to `k` indexed texts by decreasing similarity to `query`.
    pub fn search(&self, query: &str, k: usize) -> Vec<String> {
        if self.is_empty() || k == 0 {
            return Vec::new();
        }
        let Some(query) = self.embed(query) else {
            return Vec::new();
        };

        let mut hits: Vec<(f32, usize)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (dot(&query, v), i))
            .collect();
        hits.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        hits.into_iter()
            .take(k)
            .map(|(_, i)| self.corpus[i].clone())
            .collect()
    }
}

impl Recall for SemanticRecall {
    fn mode(&self) -> RecallMode {
        RecallMode::Semantic
    }

    fn index_note(&mut self, text: &str) {
        self.add_text(text);
    }

    /// Re-align the index with `notes`, reusing vectors for known texts.
    fn rebuild(&mut self, notes: &[NoteRecord]) {
        let mut known: HashMap<String, Vec<f32>> = self
            .corpus
            .drain(..)
            .zip(self.vectors.drain(..))
            .collect();

        for note in notes {
            if note.note.is_empty() {
                continue;
            }
            let vector = match known.get(&note.note) {
                Some(v) => Some(v.clone()),
                None => self.embed(&note.note),
            };
            if let Some(vector) = vector {
                known.entry(note.note.clone()).or_insert_with(|| vector.clone());
                self.corpus.push(note.note.clone());
                self.vectors.push(vector);
            }
        }
        debug!(indexed = self.len(), "Rebuilt semantic index");
    }

    fn recall(&self, _notes: &[NoteRecord], query: &RecallQuery) -> Vec<String> {
        self.search(&query.cue, query.k)
    }
}
