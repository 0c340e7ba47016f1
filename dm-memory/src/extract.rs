//! Heuristic note extraction and priority scoring.
//!
//! A generated reply is split into sentences; up to two sentences that
//! mention an action word become long-term notes. Each note is scored by the
//! topical categories it touches.

use crate::keywords::KeywordTables;
use crate::note::{NoteRecord, MAX_PRIORITY, MIN_PRIORITY};

/// Maximum notes taken from a single reply.
pub const MAX_NOTES_PER_REPLY: usize = 2;

/// Points added per matching topical category.
const CATEGORY_BONUS: u8 = 2;

/// Points added when the text carries the remember marker.
const REMEMBER_BONUS: u8 = 3;

/// Turns narrative replies into note records.
#[derive(Debug, Clone, Default)]
pub struct NoteExtractor {
    keywords: KeywordTables,
}

impl NoteExtractor {
    pub fn new(keywords: KeywordTables) -> Self {
        Self { keywords }
    }

    pub fn keywords(&self) -> &KeywordTables {
        &self.keywords
    }

    /// Score a piece of text into `1..=5`.
    ///
    /// Every category with at least one match adds two points, the remember
    /// marker adds three, and the total is capped.
    pub fn score(&self, text: &str) -> u8 {
        let lowered = text.to_lowercase();
        let mut score = MIN_PRIORITY;

        for category in &self.keywords.categories {
            if category.matches(&lowered) {
                score = score.saturating_add(CATEGORY_BONUS);
            }
        }

        let marker = self.keywords.remember_marker.to_lowercase();
        if !marker.is_empty() && lowered.contains(&marker) {
            score = score.saturating_add(REMEMBER_BONUS);
        }

        score.min(MAX_PRIORITY)
    }

    /// Pick the notable sentences of a reply and wrap them as notes.
    ///
    /// Falls back to the first sentence when none mention an action word.
    pub fn extract(&self, reply: &str, turn: i64) -> Vec<NoteRecord> {
        let sentences = split_sentences(reply);

        let mut kept: Vec<&str> = Vec::new();
        for &sentence in &sentences {
            if self.keywords.is_action(&sentence.to_lowercase()) {
                kept.push(sentence);
            }
            if kept.len() >= MAX_NOTES_PER_REPLY {
                break;
            }
        }

        if kept.is_empty() {
            kept.extend(sentences.first().copied());
        }

        kept.into_iter()
            .map(|s| NoteRecord::extracted(s, self.score(s), turn))
            .collect()
    }

    /// Build a pinned note, or `None` if the text is blank.
    pub fn pin(&self, text: &str) -> Option<NoteRecord> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(NoteRecord::pinned(text))
    }
}

/// Split on periods and newlines, dropping blank fragments.
fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
