//! Short-term dialogue window.

/// One player/DM exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRecord {
    pub user: String,
    pub dm: String,
}

/// In-memory log of every exchange this session.
///
/// The full history is kept; only the rendered view is bounded.
#[derive(Debug, Clone, Default)]
pub struct ShortTermWindow {
    turns: Vec<TurnRecord>,
}

impl ShortTermWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an exchange at the end of the history.
    pub fn append(&mut self, user: impl Into<String>, dm: impl Into<String>) {
        self.turns.push(TurnRecord {
            user: user.into(),
            dm: dm.into(),
        });
    }

    /// Render the last `window` exchanges, oldest first.
    pub fn context(&self, window: usize) -> String {
        let start = self.turns.len().saturating_sub(window);
        self.turns[start..]
            .iter()
            .flat_map(|t| [format!("Player: {}", t.user), format!("DM: {}", t.dm)])
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of exchanges recorded so far.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[TurnRecord] {
        &self.turns
    }
}
