//! The memory manager: the single surface the turn loop talks to.
//!
//! Owns the short-term window, the long-term note store, the keyword bank,
//! the consistency hint queue and the active recall strategy. Every
//! operation degrades to empty output instead of failing; storage and
//! embedding problems are logged.

use crate::compact::compact_notes;
use crate::config::MemoryConfig;
use crate::error::MemoryResult;
use crate::extract::NoteExtractor;
use crate::hints::HintQueue;
use crate::note::{normalize_records, NoteRecord};
use crate::recall::{select_strategy, Embedder, LocalEmbedder, Recall, RecallMode, RecallQuery};
use crate::store::{RecordStore, HINTS_FILE, KEYWORD_BANK_FILE, LONG_TERM_FILE};
use crate::window::ShortTermWindow;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use tracing::{debug, info, warn};

/// Header placed above recalled notes.
pub const RECALL_HEADER: &str = "Relevant notes:";

/// Header placed above a recap.
pub const RECAP_HEADER: &str = "Recent world notes:";

/// Recap text when nothing has been remembered yet.
pub const EMPTY_RECAP: &str = "No long-term notes yet.";

/// Conversational memory for one campaign.
pub struct MemoryManager {
    config: MemoryConfig,
    window: ShortTermWindow,
    notes: Vec<NoteRecord>,
    notes_store: RecordStore,
    keyword_bank: BTreeMap<String, i64>,
    hints: HintQueue,
    extractor: NoteExtractor,
    recall: Box<dyn Recall>,
    fallback_reason: Option<String>,
}

impl MemoryManager {
    /// Open the stores under `config.data_dir`, using the local embedder
    /// when semantic recall is requested.
    pub fn new(config: MemoryConfig) -> Self {
        let model = config.embedding_model.clone();
        Self::build(config, move || {
            LocalEmbedder::new(&model).map(|e| Box::new(e) as Box<dyn Embedder>)
        })
    }

    /// Open the stores with a caller-supplied embedder for semantic recall.
    pub fn with_embedder(config: MemoryConfig, embedder: Box<dyn Embedder>) -> Self {
        Self::build(config, move || Ok(embedder))
    }

    fn build<F>(config: MemoryConfig, embedder: F) -> Self
    where
        F: FnOnce() -> MemoryResult<Box<dyn Embedder>>,
    {
        if let Err(e) = fs::create_dir_all(&config.data_dir) {
            warn!(dir = %config.data_dir.display(), error = %e, "Could not create data directory");
        }

        let notes_store = RecordStore::new(config.data_dir.join(LONG_TERM_FILE));
        let raw: Vec<Value> = notes_store.load(Vec::new());
        let normalized = normalize_records(raw);
        if normalized.changed {
            info!(
                notes = normalized.records.len(),
                "Normalized malformed long-term notes, rewriting store"
            );
            notes_store.save_or_warn(&normalized.records);
        }
        let notes = normalized.records;

        let keyword_bank =
            RecordStore::new(config.data_dir.join(KEYWORD_BANK_FILE)).load(BTreeMap::new());
        let hints = HintQueue::load(RecordStore::new(config.data_dir.join(HINTS_FILE)));

        let selection = select_strategy(
            config.use_semantic_rag,
            config.recall_pool,
            &notes,
            embedder,
        );

        debug!(
            notes = notes.len(),
            hints = hints.len(),
            mode = %selection.recall.mode(),
            "Memory manager ready"
        );

        Self {
            extractor: NoteExtractor::new(config.keywords.clone()),
            config,
            window: ShortTermWindow::new(),
            notes,
            notes_store,
            keyword_bank,
            hints,
            recall: selection.recall,
            fallback_reason: selection.fallback_reason,
        }
    }

    // =========================================================================
    // Short-term window
    // =========================================================================

    /// Recent dialogue as `Player:` / `DM:` lines.
    pub fn get_short_context(&self) -> String {
        self.window.context(self.config.short_window)
    }

    /// Record one exchange.
    pub fn add_turn(&mut self, user: &str, dm: &str) {
        self.window.append(user, dm);
    }

    // =========================================================================
    // Long-term notes
    // =========================================================================

    /// Extract notes from a generated reply, store and index them.
    ///
    /// Returns the notes that were added.
    pub fn extract_key_events(&mut self, reply: &str, turn: i64) -> Vec<NoteRecord> {
        let extracted = self.extractor.extract(reply, turn);
        if extracted.is_empty() {
            return extracted;
        }

        for note in &extracted {
            self.recall.index_note(&note.note);
        }
        self.notes.extend(extracted.iter().cloned());
        self.persist_notes();

        debug!(turn, added = extracted.len(), "Extracted key events");
        extracted
    }

    /// Pin a player-supplied fact at top priority.
    ///
    /// Returns `None` (and stores nothing) when the text is blank; the
    /// caller should show a usage hint.
    pub fn pin_note(&mut self, text: &str) -> Option<NoteRecord> {
        let note = self.extractor.pin(text)?;
        self.recall.index_note(&note.note);
        self.notes.push(note.clone());
        self.persist_notes();
        Some(note)
    }

    /// Notes relevant to `cue`, rendered as a bulleted block, or `""`.
    pub fn recall_relevant(&self, k: usize, cue: &str, npc_focus: &[String]) -> String {
        let query = RecallQuery::new(cue, k).with_focus(npc_focus.to_vec());
        let hits = self.recall.recall(&self.notes, &query);
        debug!(mode = %self.recall.mode(), hits = hits.len(), "Recalled notes");

        if hits.is_empty() {
            return String::new();
        }
        let bullets: Vec<String> = hits.iter().map(|h| format!("- {h}")).collect();
        format!("{RECALL_HEADER}\n{}", bullets.join("\n"))
    }

    /// The most recent notes as a human-readable recap.
    pub fn recap(&self) -> String {
        let start = self.notes.len().saturating_sub(self.config.recap_len);
        let tail = &self.notes[start..];
        if tail.is_empty() {
            return EMPTY_RECAP.to_string();
        }

        let lines: Vec<String> = tail
            .iter()
            .filter(|r| !r.note.is_empty())
            .map(|r| format!("- {}", r.note))
            .collect();
        format!("{RECAP_HEADER}\n{}", lines.join("\n"))
    }

    /// Deduplicate and cap the long-term store, keeping the newest notes.
    pub fn compact_long_memory(&mut self, max_notes: usize) {
        if self.notes.is_empty() {
            return;
        }

        let before = self.notes.len();
        self.notes = compact_notes(&self.notes, max_notes);
        self.persist_notes();
        self.recall.rebuild(&self.notes);

        debug!(before, after = self.notes.len(), "Compacted long-term memory");
    }

    // =========================================================================
    // Consistency hints
    // =========================================================================

    /// Queue a reminder for upcoming prompts. Returns whether it was new.
    pub fn add_consistency_hint(&mut self, hint: &str) -> bool {
        self.hints.add(hint)
    }

    /// Drain the oldest queued reminders into a prompt block, or `""`.
    pub fn pop_consistency_hints(&mut self) -> String {
        self.hints.drain(self.config.hint_batch)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// All long-term notes, oldest first.
    pub fn long_memory(&self) -> &[NoteRecord] {
        &self.notes
    }

    /// The reserved keyword bank.
    pub fn keyword_bank(&self) -> &BTreeMap<String, i64> {
        &self.keyword_bank
    }

    /// The active recall strategy.
    pub fn mode(&self) -> RecallMode {
        self.recall.mode()
    }

    /// Why semantic recall was requested but not used, if it was.
    pub fn fallback_reason(&self) -> Option<&str> {
        self.fallback_reason.as_deref()
    }

    /// Number of exchanges recorded this session.
    pub fn turn_count(&self) -> usize {
        self.window.len()
    }

    /// Number of queued consistency hints.
    pub fn pending_hints(&self) -> usize {
        self.hints.len()
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    fn persist_notes(&self) {
        self.notes_store.save_or_warn(&self.notes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{temp_config, MockEmbedder};
    use tempfile::TempDir;

    #[test]
    fn test_new_manager_is_empty() {
        let dir = TempDir::new().unwrap();
        let memory = MemoryManager::new(temp_config(dir.path()));

        assert!(memory.long_memory().is_empty());
        assert_eq!(memory.get_short_context(), "");
        assert_eq!(memory.recap(), EMPTY_RECAP);
        assert_eq!(memory.mode(), RecallMode::Lightweight);
        assert!(memory.fallback_reason().is_none());
    }

    #[test]
    fn test_pin_and_recap() {
        let dir = TempDir::new().unwrap();
        let mut memory = MemoryManager::new(temp_config(dir.path()));

        let pinned = memory.pin_note("The lantern is cursed").unwrap();
        assert_eq!(pinned.turn, -1);
        assert!(memory.recap().contains("The lantern is cursed"));
        assert!(memory.pin_note("   ").is_none());
        assert_eq!(memory.long_memory().len(), 1);
    }

    #[test]
    fn test_recap_shows_last_notes() {
        let dir = TempDir::new().unwrap();
        let mut memory = MemoryManager::new(temp_config(dir.path()));
        for i in 0..15 {
            memory.pin_note(&format!("fact {i}"));
        }

        let recap = memory.recap();
        assert!(recap.starts_with(RECAP_HEADER));
        assert_eq!(recap.lines().count(), 13);
        assert!(!recap.contains("fact 2\n"));
        assert!(recap.ends_with("- fact 14"));
    }

    #[test]
    fn test_short_context_uses_window() {
        let dir = TempDir::new().unwrap();
        let mut memory = MemoryManager::new(temp_config(dir.path()).with_short_window(1));
        memory.add_turn("hello", "hi");
        memory.add_turn("look", "a cave");

        assert_eq!(memory.get_short_context(), "Player: look\nDM: a cave");
        assert_eq!(memory.turn_count(), 2);
    }

    #[test]
    fn test_recall_relevant_format() {
        let dir = TempDir::new().unwrap();
        let mut memory = MemoryManager::new(temp_config(dir.path()));
        assert_eq!(memory.recall_relevant(3, "anything", &[]), "");

        memory.extract_key_events("You find a golden key.", 1);
        let recalled = memory.recall_relevant(3, "key", &[]);
        assert_eq!(recalled, "Relevant notes:\n- You find a golden key");
    }

    #[test]
    fn test_semantic_fallback_is_reported() {
        let dir = TempDir::new().unwrap();
        let config = temp_config(dir.path())
            .with_semantic_rag(true)
            .with_embedding_model("no-such-model");
        let memory = MemoryManager::new(config);

        assert_eq!(memory.mode(), RecallMode::Lightweight);
        assert!(memory.fallback_reason().is_some());
    }

    #[test]
    fn test_semantic_mode_indexes_new_notes() {
        let dir = TempDir::new().unwrap();
        let config = temp_config(dir.path()).with_semantic_rag(true);
        let mut memory = MemoryManager::with_embedder(config, Box::new(MockEmbedder::new()));
        assert_eq!(memory.mode(), RecallMode::Semantic);

        memory.pin_note("The ferryman wants silver");
        memory.extract_key_events("You discover an ancient temple.", 2);

        let recalled = memory.recall_relevant(1, "ancient temple ruins", &[]);
        assert_eq!(recalled, "Relevant notes:\n- You discover an ancient temple");
    }

    #[test]
    fn test_semantic_index_follows_compaction() {
        let dir = TempDir::new().unwrap();
        let config = temp_config(dir.path()).with_semantic_rag(true);
        let mut memory = MemoryManager::with_embedder(config, Box::new(MockEmbedder::new()));

        memory.pin_note("The old mill burned down");
        memory.pin_note("The bridge toll is two coins");
        memory.compact_long_memory(1);

        let recalled = memory.recall_relevant(3, "old mill burned", &[]);
        assert_eq!(recalled, "Relevant notes:\n- The bridge toll is two coins");
    }

    #[test]
    fn test_hints_round_trip_through_manager() {
        let dir = TempDir::new().unwrap();
        let mut memory = MemoryManager::new(temp_config(dir.path()));

        assert!(memory.add_consistency_hint("Reminder: Mira is dead"));
        assert!(!memory.add_consistency_hint("Reminder: Mira is dead"));
        assert_eq!(memory.pending_hints(), 1);
        assert_eq!(
            memory.pop_consistency_hints(),
            "Consistency hints:\n- Reminder: Mira is dead"
        );
        assert_eq!(memory.pop_consistency_hints(), "");
    }

    #[test]
    fn test_compact_on_empty_store_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut memory = MemoryManager::new(temp_config(dir.path()));
        memory.compact_long_memory(5);

        assert!(!dir.path().join(LONG_TERM_FILE).exists());
    }
}
