//! Heuristic keyword tables.
//!
//! Plain data consumed by the extractor and priority scorer. Swap or extend
//! them through [`crate::MemoryConfig::with_keywords`] or a JSON file.

use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A named topical category and its trigger phrases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCategory {
    pub name: String,
    pub words: Vec<String>,
}

impl KeywordCategory {
    pub fn new(name: impl Into<String>, words: &[&str]) -> Self {
        Self {
            name: name.into(),
            words: words.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Whether any trigger phrase occurs in already-lowercased text.
    ///
    /// Trigger phrases match regardless of their own case.
    pub fn matches(&self, lowered: &str) -> bool {
        contains_any(lowered, &self.words)
    }
}

/// Keyword sets driving extraction and scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTables {
    /// Topical categories; each matching category adds to a note's priority.
    pub categories: Vec<KeywordCategory>,
    /// Words that mark a reply sentence as worth remembering.
    pub action_words: Vec<String>,
    /// Marker that strongly boosts priority.
    pub remember_marker: String,
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self {
            categories: vec![
                KeywordCategory::new("quest", &["quest", "mission", "task", "contract"]),
                KeywordCategory::new(
                    "item",
                    &[
                        "sword", "key", "map", "feather", "ring", "amulet", "potion", "lantern",
                        "gem", "scroll",
                    ],
                ),
                KeywordCategory::new(
                    "ally",
                    &["joins you", "agrees to help", "companion", "party member", "ally"],
                ),
                KeywordCategory::new(
                    "lore",
                    &["prophecy", "legend", "ancient", "ritual", "temple", "kingdom", "order"],
                ),
            ],
            action_words: [
                "find", "give", "take", "enter", "warn", "agree", "attack", "discover", "feather",
                "lantern", "key", "map",
            ]
            .iter()
            .map(|w| w.to_string())
            .collect(),
            remember_marker: "remember:".to_string(),
        }
    }
}

impl KeywordTables {
    /// Load tables from a JSON file, falling back to the built-in defaults.
    pub fn load(path: impl AsRef<Path>) -> Self {
        RecordStore::new(path.as_ref()).load(Self::default())
    }

    /// Whether already-lowercased text contains an action word.
    pub fn is_action(&self, lowered: &str) -> bool {
        contains_any(lowered, &self.action_words)
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .any(|w| !w.is_empty() && haystack.contains(&w.to_lowercase()))
}
