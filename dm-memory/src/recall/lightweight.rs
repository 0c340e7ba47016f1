//! Keyword-heuristic recall over the stored notes.

use super::{Recall, RecallMode, RecallQuery};
use crate::note::NoteRecord;

/// Scores recent notes by priority plus cue and NPC-focus hits.
#[derive(Debug, Clone)]
pub struct LightweightRecall {
    pool_size: usize,
}

impl LightweightRecall {
    /// Rank over at most the `pool_size` most recent notes.
    pub fn new(pool_size: usize) -> Self {
        Self { pool_size }
    }

    /// Rank notes and return the top `query.k`, best first.
    ///
    /// Primary key is the priority, raised by one when an NPC-focus token
    /// and by one when a cue token occurs in the note. Ties go to the more
    /// recent turn, then to the earlier position in the store.
    pub fn rank<'a>(&self, notes: &'a [NoteRecord], query: &RecallQuery) -> Vec<&'a NoteRecord> {
        let start = notes.len().saturating_sub(self.pool_size);
        let cue = query.cue.to_lowercase();
        let cue_tokens: Vec<&str> = cue.split_whitespace().collect();
        let focus: Vec<String> = query
            .npc_focus
            .iter()
            .map(|w| w.to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        let mut scored: Vec<((i64, i64), &NoteRecord)> = notes[start..]
            .iter()
            .filter(|r| r.has_text())
            .map(|r| {
                let text = r.note.to_lowercase();
                let mut score = i64::from(r.priority);
                if focus.iter().any(|w| text.contains(w.as_str())) {
                    score += 1;
                }
                if cue_tokens.iter().any(|w| text.contains(w)) {
                    score += 1;
                }
                ((score, r.turn), r)
            })
            .collect();

        // Stable sort keeps store order among equal keys.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(query.k).map(|(_, r)| r).collect()
    }
}

impl Recall for LightweightRecall {
    fn mode(&self) -> RecallMode {
        RecallMode::Lightweight
    }

    fn index_note(&mut self, _text: &str) {}

    fn rebuild(&mut self, _notes: &[NoteRecord]) {}

    fn recall(&self, notes: &[NoteRecord], query: &RecallQuery) -> Vec<String> {
        self.rank(notes, query)
            .into_iter()
            .map(|r| r.note.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(text: &str, priority: u8, turn: i64) -> NoteRecord {
        NoteRecord::extracted(text, priority, turn)
    }

    fn texts(ranked: Vec<&NoteRecord>) -> Vec<&str> {
        ranked.into_iter().map(|r| r.note.as_str()).collect()
    }

    #[test]
    fn test_priority_orders_results() {
        let notes = vec![note("low", 1, 1), note("high", 5, 2), note("mid", 3, 3)];
        let recall = LightweightRecall::new(200);

        let ranked = recall.rank(&notes, &RecallQuery::new("", 3));
        assert_eq!(texts(ranked), vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_ties_prefer_recent_turn() {
        let notes = vec![note("older", 3, 1), note("newer", 3, 9), note("middle", 3, 5)];
        let recall = LightweightRecall::new(200);

        let ranked = recall.rank(&notes, &RecallQuery::new("", 3));
        assert_eq!(texts(ranked), vec!["newer", "middle", "older"]);
    }

    #[test]
    fn test_cue_and_focus_boost() {
        let notes = vec![
            note("Mira guards the bridge", 2, 1),
            note("The bridge is out", 2, 2),
            note("A storm gathers", 3, 3),
        ];
        let recall = LightweightRecall::new(200);
        let query = RecallQuery::new("BRIDGE", 3).with_focus(vec!["Mira".to_string()]);

        let ranked = recall.rank(&notes, &query);
        assert_eq!(
            texts(ranked),
            vec!["Mira guards the bridge", "A storm gathers", "The bridge is out"]
        );
    }

    #[test]
    fn test_pool_is_bounded_to_recent_notes() {
        let notes = vec![note("ancient high", 5, 0), note("recent", 1, 1), note("latest", 1, 2)];
        let recall = LightweightRecall::new(2);

        let ranked = recall.rank(&notes, &RecallQuery::new("", 5));
        assert_eq!(texts(ranked), vec!["latest", "recent"]);
    }

    #[test]
    fn test_blank_notes_are_skipped() {
        let notes = vec![note("  ", 5, 3), note("real", 1, 1)];
        let recall = LightweightRecall::new(200);

        let ranked = recall.rank(&notes, &RecallQuery::new("", 5));
        assert_eq!(texts(ranked), vec!["real"]);
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let notes: Vec<_> = (0..20)
            .map(|i| note(&format!("note {i}"), (i % 5 + 1) as u8, (i % 3) as i64))
            .collect();
        let recall = LightweightRecall::new(200);
        let query = RecallQuery::new("note 1", 7).with_focus(vec!["note".to_string()]);

        let first = texts(recall.rank(&notes, &query));
        let second = texts(recall.rank(&notes, &query));
        assert_eq!(first, second);
        assert_eq!(first.len(), 7);
    }

    #[test]
    fn test_k_zero() {
        let notes = vec![note("a", 1, 1)];
        assert!(LightweightRecall::new(200)
            .rank(&notes, &RecallQuery::new("a", 0))
            .is_empty());
    }
}
