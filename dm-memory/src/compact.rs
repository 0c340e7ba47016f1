//! Long-term note compaction.

use crate::note::NoteRecord;
use std::collections::HashSet;

/// Deduplicate and cap a chronological note list.
///
/// Walks from newest to oldest keeping the first (newest) note for each
/// trimmed, lowercased text until `max_notes` are kept, then restores
/// chronological order. Blank notes are dropped.
pub fn compact_notes(notes: &[NoteRecord], max_notes: usize) -> Vec<NoteRecord> {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();

    for record in notes.iter().rev() {
        if kept.len() >= max_notes {
            break;
        }
        let key = record.dedup_key();
        if !key.is_empty() && seen.insert(key) {
            kept.push(record.clone());
        }
    }

    kept.reverse();
    kept
}
