//! One play session: feeds memory into each model call and records the result.

use crate::prompt::{build_messages, guess_npc_focus, trim_bullets, SYSTEM_PROMPT};
use dm_memory::{MemoryConfig, MemoryManager, NoteRecord};
use llm::ChatService;
use tracing::{debug, warn};

/// Prefix that turns player input into a pinned note.
pub const PIN_PREFIX: &str = "remember:";

/// Input used when the player submits an empty line.
pub const IDLE_ACTION: &str = "Look around quietly.";

/// Hint queued when a reply reports a death.
pub const DEATH_HINT: &str = "Reminder: confirm death states; notes may mark this NPC as alive.";

/// Cadence and limits for memory work within a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Recall long-term notes every this many turns.
    pub recall_every: u64,
    /// Notes recalled per prompt.
    pub recall_k: usize,
    /// Character budget for the recalled block.
    pub recall_budget: usize,
    /// Compact long-term memory every this many turns.
    pub compact_every: u64,
    /// Notes kept after compaction.
    pub max_notes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            recall_every: 4,
            recall_k: 3,
            recall_budget: 1200,
            compact_every: 4,
            max_notes: 18,
        }
    }
}

impl SessionConfig {
    /// Defaults with `MAX_NOTES` taken from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(max) = std::env::var("MAX_NOTES").ok().and_then(|v| v.trim().parse().ok()) {
            config.max_notes = max;
        }
        config
    }

    pub fn with_max_notes(mut self, max_notes: usize) -> Self {
        self.max_notes = max_notes;
        self
    }
}

/// What happened in response to one line of player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A `remember:` command stored a note.
    Pinned(NoteRecord),
    /// A `remember:` command had no note text.
    PinUsage,
    /// Session state was reset.
    Reset,
    /// The Dungeon Master replied.
    Narrative(String),
}

/// A running game backed by a chat service and persistent memory.
pub struct Session<C> {
    chat: C,
    memory: MemoryManager,
    memory_config: MemoryConfig,
    config: SessionConfig,
    turn: u64,
}

impl<C: ChatService> Session<C> {
    /// Start a session, opening memory from `memory_config`.
    pub fn new(chat: C, memory_config: MemoryConfig, config: SessionConfig) -> Self {
        Self {
            chat,
            memory: MemoryManager::new(memory_config.clone()),
            memory_config,
            config,
            turn: 0,
        }
    }

    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    /// Turns played since the session started or was reset.
    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// Reopen memory from disk and clear the turn counter and dialogue.
    pub fn reset(&mut self) {
        self.memory = MemoryManager::new(self.memory_config.clone());
        self.turn = 0;
    }

    /// Handle one line of player input.
    pub async fn handle(&mut self, input: &str) -> TurnOutcome {
        let trimmed = input.trim();
        let text = if trimmed.is_empty() { IDLE_ACTION } else { trimmed };

        if text.eq_ignore_ascii_case("reset") {
            self.reset();
            return TurnOutcome::Reset;
        }

        if let Some(note) = strip_prefix_ignore_case(text, PIN_PREFIX) {
            return match self.memory.pin_note(note) {
                Some(record) => TurnOutcome::Pinned(record),
                None => TurnOutcome::PinUsage,
            };
        }

        self.turn += 1;
        let npc_focus = guess_npc_focus(text);

        let long_ctx = if is_due(self.turn, self.config.recall_every) {
            self.memory
                .recall_relevant(self.config.recall_k, text, &npc_focus)
        } else {
            String::new()
        };
        let long_ctx = trim_bullets(&long_ctx, self.config.recall_budget);
        let short_ctx = self.memory.get_short_context();
        let hints = self.memory.pop_consistency_hints();

        let messages = build_messages(SYSTEM_PROMPT, &short_ctx, &long_ctx, &hints, text);
        let reply = match self.chat.chat(&messages).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(turn = self.turn, error = %e, transient = e.is_transient(), "Chat failed");
                format!("(Error contacting model: {e})")
            }
        };

        let lowered = reply.to_lowercase();
        if lowered.contains(" died") || lowered.contains(" is dead") {
            self.memory.add_consistency_hint(DEATH_HINT);
        }

        self.memory.add_turn(text, &reply);
        self.memory.extract_key_events(&reply, self.turn as i64);

        if is_due(self.turn, self.config.compact_every) {
            self.memory.compact_long_memory(self.config.max_notes);
        }

        debug!(turn = self.turn, notes = self.memory.long_memory().len(), "Turn complete");
        TurnOutcome::Narrative(reply)
    }
}

/// Whether a task running every `every` turns falls on `turn`. Zero disables it.
fn is_due(turn: u64, every: u64) -> bool {
    every != 0 && turn % every == 0
}

/// The text after `prefix`, trimmed, if `text` starts with it (ASCII case-insensitive).
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| text[prefix.len()..].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dm_memory::testing::temp_config;
    use llm::{Error, Message};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Returns scripted replies in order and records every prompt.
    struct MockChat {
        replies: Mutex<Vec<Result<String, Error>>>,
        prompts: Mutex<Vec<Vec<Message>>>,
    }

    impl MockChat {
        fn new(replies: Vec<Result<String, Error>>) -> Self {
            let mut replies = replies;
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn narrating(replies: &[&str]) -> Self {
            Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
        }

        fn last_user_prompt(&self) -> String {
            let prompts = self.prompts.lock().unwrap();
            prompts.last().unwrap()[1].content.clone()
        }
    }

    #[async_trait]
    impl ChatService for MockChat {
        async fn chat(&self, messages: &[Message]) -> Result<String, Error> {
            self.prompts.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok("The world is quiet.".to_string()))
        }
    }

    fn session(dir: &TempDir, chat: MockChat) -> Session<MockChat> {
        Session::new(chat, temp_config(dir.path()), SessionConfig::default())
    }

    #[tokio::test]
    async fn test_pin_command() {
        let dir = TempDir::new().unwrap();
        let mut game = session(&dir, MockChat::narrating(&[]));

        let outcome = game.handle("Remember: the lantern is cursed").await;
        assert_eq!(outcome, TurnOutcome::Pinned(NoteRecord::pinned("the lantern is cursed")));
        assert_eq!(game.handle("remember:   ").await, TurnOutcome::PinUsage);
        assert_eq!(game.turn(), 0);
        assert!(game.memory().recap().contains("the lantern is cursed"));
    }

    #[tokio::test]
    async fn test_turn_records_dialogue_and_notes() {
        let dir = TempDir::new().unwrap();
        let mut game = session(&dir, MockChat::narrating(&["You find a golden key. The door creaks open."]));

        let outcome = game.handle("I search the altar").await;
        assert_eq!(
            outcome,
            TurnOutcome::Narrative("You find a golden key. The door creaks open.".to_string())
        );
        assert_eq!(game.turn(), 1);
        assert!(game.memory().get_short_context().starts_with("Player: I search the altar"));
        assert_eq!(game.memory().long_memory()[0].note, "You find a golden key");
        assert_eq!(game.memory().long_memory()[0].turn, 1);
    }

    #[tokio::test]
    async fn test_empty_input_becomes_idle_action() {
        let dir = TempDir::new().unwrap();
        let chat = MockChat::narrating(&["Nothing stirs."]);
        let mut game = session(&dir, chat);

        game.handle("   ").await;
        assert_eq!(game.chat.last_user_prompt(), format!("Player says: {IDLE_ACTION}"));
    }

    #[tokio::test]
    async fn test_recall_only_on_cadence() {
        let dir = TempDir::new().unwrap();
        let mut game = session(&dir, MockChat::narrating(&[]));
        game.handle("remember: Mira hides the map").await;

        for _ in 0..3 {
            game.handle("I walk on").await;
            assert!(!game.chat.last_user_prompt().contains("Relevant notes:"));
        }
        game.handle("I ask Mira about the map").await;
        assert!(game
            .chat
            .last_user_prompt()
            .starts_with("Relevant notes:\n- Mira hides the map"));
    }

    #[tokio::test]
    async fn test_death_reply_queues_hint_for_next_prompt() {
        let dir = TempDir::new().unwrap();
        let chat = MockChat::narrating(&["The old guard died in the night.", "You bury him."]);
        let mut game = session(&dir, chat);

        game.handle("I check on the guard").await;
        assert_eq!(game.memory().pending_hints(), 1);

        game.handle("I dig a grave").await;
        assert!(game
            .chat
            .last_user_prompt()
            .starts_with(&format!("Consistency hints:\n- {DEATH_HINT}")));
        assert_eq!(game.memory().pending_hints(), 0);
    }

    #[tokio::test]
    async fn test_chat_failure_becomes_narrative() {
        let dir = TempDir::new().unwrap();
        let mut game = session(&dir, MockChat::new(vec![Err(Error::RateLimited)]));

        match game.handle("Hello?").await {
            TurnOutcome::Narrative(text) => {
                assert!(text.starts_with("(Error contacting model: Rate limit"))
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(game.memory().turn_count(), 1);
    }

    #[tokio::test]
    async fn test_compaction_on_cadence() {
        let dir = TempDir::new().unwrap();
        let chat = MockChat::narrating(&["The rain falls.", "The rain falls.", "The rain falls.", "The rain falls."]);
        let mut game = Session::new(
            chat,
            temp_config(dir.path()),
            SessionConfig::default().with_max_notes(18),
        );

        for _ in 0..3 {
            game.handle("wait").await;
        }
        assert_eq!(game.memory().long_memory().len(), 3);

        game.handle("wait").await;
        assert_eq!(game.memory().long_memory().len(), 1);
        assert_eq!(game.memory().long_memory()[0].turn, 4);
    }

    #[tokio::test]
    async fn test_reset_clears_turns_but_keeps_notes() {
        let dir = TempDir::new().unwrap();
        let mut game = session(&dir, MockChat::narrating(&["You take the ring."]));
        game.handle("grab it").await;

        assert_eq!(game.handle("RESET").await, TurnOutcome::Reset);
        assert_eq!(game.turn(), 0);
        assert_eq!(game.memory().get_short_context(), "");
        assert_eq!(game.memory().long_memory().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_cadence_disables_recall_and_compaction() {
        let dir = TempDir::new().unwrap();
        let config = SessionConfig {
            recall_every: 0,
            compact_every: 0,
            ..SessionConfig::default()
        };
        let mut game = Session::new(MockChat::narrating(&[]), temp_config(dir.path()), config);
        game.handle("remember: Mira hides the map").await;

        for _ in 0..4 {
            game.handle("I ask Mira").await;
            assert!(!game.chat.last_user_prompt().contains("Relevant notes:"));
        }
        // Four identical replies stay uncompacted.
        assert_eq!(game.memory().long_memory().len(), 5);
    }

    #[test]
    fn test_is_due() {
        assert!(is_due(4, 4));
        assert!(!is_due(3, 4));
        assert!(!is_due(4, 0));
    }

    #[test]
    fn test_strip_prefix_ignore_case() {
        assert_eq!(strip_prefix_ignore_case("REMEMBER: x ", PIN_PREFIX), Some("x"));
        assert_eq!(strip_prefix_ignore_case("rem", PIN_PREFIX), None);
        assert_eq!(strip_prefix_ignore_case("remind me", PIN_PREFIX), None);
    }
}
