//! Consistency hint queue.
//!
//! Short reminders queued for the next prompts, e.g. to double-check that a
//! character reported dead is not brought back by stale notes.

use crate::store::RecordStore;
use std::collections::VecDeque;

/// Header placed above drained hints.
pub const HINTS_HEADER: &str = "Consistency hints:";

/// Persistent FIFO of unique hint strings.
#[derive(Debug)]
pub struct HintQueue {
    hints: VecDeque<String>,
    store: RecordStore,
}

impl HintQueue {
    /// Load the queue from its store (empty if missing or unreadable).
    pub fn load(store: RecordStore) -> Self {
        let hints: Vec<String> = store.load(Vec::new());
        Self {
            hints: hints.into(),
            store,
        }
    }

    /// Queue a hint unless it is empty or already queued. Returns whether it was added.
    pub fn add(&mut self, hint: &str) -> bool {
        if hint.is_empty() || self.hints.iter().any(|h| h == hint) {
            return false;
        }
        self.hints.push_back(hint.to_string());
        self.persist();
        true
    }

    /// Pop up to `max` hints, oldest first, rendered as a bulleted block.
    ///
    /// Returns an empty string when the queue is empty.
    pub fn drain(&mut self, max: usize) -> String {
        let take = max.min(self.hints.len());
        if take == 0 {
            return String::new();
        }
        let popped: Vec<String> = self.hints.drain(..take).collect();
        self.persist();

        let bullets: Vec<String> = popped.iter().map(|h| format!("- {h}")).collect();
        format!("{HINTS_HEADER}\n{}", bullets.join("\n"))
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    /// Pending hints, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.hints.iter().map(String::as_str)
    }

    fn persist(&self) {
        self.store.save_or_warn(&self.hints);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn queue(dir: &TempDir) -> HintQueue {
        HintQueue::load(RecordStore::new(dir.path().join("hints.json")))
    }

    #[test]
    fn test_fifo_drain() {
        let dir = TempDir::new().unwrap();
        let mut hints = queue(&dir);
        hints.add("A");
        hints.add("B");
        hints.add("C");

        assert_eq!(hints.drain(2), "Consistency hints:\n- A\n- B");
        assert_eq!(hints.drain(2), "Consistency hints:\n- C");
        assert_eq!(hints.drain(2), "");
    }

    #[test]
    fn test_duplicates_and_blanks_ignored() {
        let dir = TempDir::new().unwrap();
        let mut hints = queue(&dir);

        assert!(hints.add("Check the ledger"));
        assert!(!hints.add("Check the ledger"));
        assert!(!hints.add(""));
        assert_eq!(hints.len(), 1);
    }

    #[test]
    fn test_state_survives_reload() {
        let dir = TempDir::new().unwrap();
        {
            let mut hints = queue(&dir);
            hints.add("A");
            hints.add("B");
            hints.add("C");
            hints.drain(1);
        }

        let reloaded = queue(&dir);
        assert_eq!(reloaded.pending().collect::<Vec<_>>(), vec!["B", "C"]);
    }

    #[test]
    fn test_drain_zero() {
        let dir = TempDir::new().unwrap();
        let mut hints = queue(&dir);
        hints.add("A");

        assert_eq!(hints.drain(0), "");
        assert_eq!(hints.len(), 1);
    }
}
