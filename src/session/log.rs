//! Turn log.
//!
//! Append-only record of the dice rolls in one game. Entries are never
//! mutated or reordered once written.

/// One recorded dice roll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Monotonic sequence number, starting at 1.
    pub seq: u64,

    /// Name of the player who rolled.
    pub player: String,

    /// Face value rolled.
    pub value: u8,

    /// When the roll was recorded.
    pub rolled_at: chrono::DateTime<chrono::Utc>,
}

impl LogEntry {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "seq": self.seq,
            "player": self.player,
            "value": self.value,
            "rolledAt": self.rolled_at
        })
    }
}

/// Append-only roll log for one game.
#[derive(Debug, Default)]
pub struct TurnLog {
    entries: Vec<LogEntry>,
}

impl TurnLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a roll, assigning it the next sequence number.
    pub fn record(&mut self, player: &str, value: u8) -> &LogEntry {
        let entry = LogEntry {
            seq: self.entries.len() as u64 + 1,
            player: player.to_string(),
            value,
            rolled_at: chrono::Utc::now(),
        };
        self.entries.push(entry);
        self.entries.last().expect("entry was just pushed")
    }

    /// Iterate past rolls in order. Restartable; each call reads from
    /// the start.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Copy the log out, oldest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.clone()
    }

    /// Most recent roll, if any.
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let entries: Vec<serde_json::Value> = self.entries.iter().map(|e| e.to_json()).collect();
        serde_json::Value::Array(entries)
    }
}
