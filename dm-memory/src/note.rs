//! Long-term note records and load-time normalization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Turn value marking a note pinned by the player rather than extracted.
pub const PINNED_TURN: i64 = -1;

/// Tag attached to pinned notes.
pub const PINNED_TAG: &str = "HIGH";

/// Lowest priority a note can carry.
pub const MIN_PRIORITY: u8 = 1;

/// Highest priority a note can carry.
pub const MAX_PRIORITY: u8 = 5;

const DEFAULT_PRIORITY: i64 = MIN_PRIORITY as i64;
const DEFAULT_TURN: i64 = 0;

/// A single long-term memory fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    /// The remembered text.
    pub note: String,
    /// Free-form tags (`HIGH` for pinned notes).
    #[serde(default)]
    pub tags: Vec<String>,
    /// Importance in `1..=5`.
    pub priority: u8,
    /// Turn the note was produced on, or [`PINNED_TURN`].
    pub turn: i64,
}

impl NoteRecord {
    /// A note extracted from a narrative reply.
    pub fn extracted(note: impl Into<String>, priority: u8, turn: i64) -> Self {
        Self {
            note: note.into(),
            tags: Vec::new(),
            priority: priority.clamp(MIN_PRIORITY, MAX_PRIORITY),
            turn,
        }
    }

    /// A note pinned explicitly by the player.
    pub fn pinned(note: impl Into<String>) -> Self {
        Self {
            note: note.into(),
            tags: vec![PINNED_TAG.to_string()],
            priority: MAX_PRIORITY,
            turn: PINNED_TURN,
        }
    }

    /// Whether this note was pinned rather than extracted.
    pub fn is_pinned(&self) -> bool {
        self.turn == PINNED_TURN
    }

    /// Whether the note carries any visible text.
    pub fn has_text(&self) -> bool {
        !self.note.trim().is_empty()
    }

    /// Key under which two notes count as duplicates.
    pub fn dedup_key(&self) -> String {
        self.note.trim().to_lowercase()
    }
}

/// Result of normalizing a raw record set.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub records: Vec<NoteRecord>,
    /// True if any value had to be coerced or dropped.
    pub changed: bool,
}

/// Coerce loosely-typed persisted records into [`NoteRecord`]s.
///
/// `priority` and `turn` are coerced to integers (falling back to `1` and
/// `0`), priorities are clamped into `1..=5`, and non-string notes are
/// stringified. Entries that are not JSON objects are dropped. Running this
/// over its own serialized output changes nothing.
pub fn normalize_records(raw: Vec<Value>) -> Normalized {
    let mut changed = false;
    let mut records = Vec::with_capacity(raw.len());

    for value in raw {
        let Value::Object(map) = value else {
            changed = true;
            continue;
        };

        let (priority, priority_changed) = coerce_int(map.get("priority"), DEFAULT_PRIORITY);
        let clamped = priority.clamp(MIN_PRIORITY as i64, MAX_PRIORITY as i64);
        let (turn, turn_changed) = coerce_int(map.get("turn"), DEFAULT_TURN);
        let (note, note_changed) = coerce_note(map.get("note"));
        let (tags, tags_changed) = coerce_tags(map.get("tags"));

        changed |= priority_changed || clamped != priority || turn_changed || note_changed || tags_changed;

        records.push(NoteRecord {
            note,
            tags,
            priority: clamped as u8,
            turn,
        });
    }

    Normalized { records, changed }
}

fn coerce_int(value: Option<&Value>, default: i64) -> (i64, bool) {
    match value {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => (i, false),
            None => n
                .as_f64()
                .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| (f.trunc() as i64, true))
                .unwrap_or((default, true)),
        },
        Some(Value::String(s)) => (s.trim().parse().unwrap_or(default), true),
        Some(Value::Bool(b)) => (i64::from(*b), true),
        _ => (default, true),
    }
}

fn coerce_note(value: Option<&Value>) -> (String, bool) {
    match value {
        Some(Value::String(s)) => (s.clone(), false),
        None | Some(Value::Null) => (String::new(), false),
        Some(other) => (other.to_string(), true),
    }
}

fn coerce_tags(value: Option<&Value>) -> (Vec<String>, bool) {
    match value {
        None => (Vec::new(), false),
        Some(Value::Array(items)) => {
            let mut changed = false;
            let tags = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => {
                        changed = true;
                        other.to_string()
                    }
                })
                .collect();
            (tags, changed)
        }
        Some(_) => (Vec::new(), true),
    }
}
