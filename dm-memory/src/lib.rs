//! Conversational memory for an AI Dungeon Master.
//!
//! This crate decides what context goes into each language-model call and
//! what is kept afterwards:
//! - A short-term window of recent dialogue
//! - Long-term notes extracted from replies or pinned by the player
//! - Lightweight (keyword) or semantic (embedding) recall of those notes
//! - A queue of consistency hints for upcoming prompts
//! - Compaction to keep the note store small
//!
//! # Quick Start
//!
//! ```ignore
//! use dm_memory::{MemoryConfig, MemoryManager};
//!
//! let mut memory = MemoryManager::new(MemoryConfig::new(4, false));
//!
//! memory.add_turn("I search the altar", "You find a golden key.");
//! memory.extract_key_events("You find a golden key.", 1);
//!
//! let notes = memory.recall_relevant(3, "Where is the key?", &[]);
//! println!("{notes}");
//! ```

pub mod compact;
pub mod config;
pub mod error;
pub mod extract;
pub mod hints;
pub mod keywords;
pub mod manager;
pub mod note;
pub mod recall;
pub mod store;
pub mod testing;
pub mod window;

pub use config::MemoryConfig;
pub use error::{MemoryError, MemoryResult};
pub use keywords::{KeywordCategory, KeywordTables};
pub use manager::MemoryManager;
pub use note::NoteRecord;
pub use recall::{Embedder, RecallMode, RecallQuery};
pub use window::{ShortTermWindow, TurnRecord};
