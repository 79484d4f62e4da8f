//! Per-game notification channel.
//!
//! Every roster or turn mutation publishes an event so pollers can
//! observe the latest state without racing in-flight mutations.
//! Publishing is fire-and-forget: senders are unbounded and a slow or
//! vanished subscriber can never stall the mutating call.

use crate::session::colors::Color;

/// Something that happened inside one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    PlayerJoined {
        player: String,
        color: Color,
    },
    PlayerLeft {
        player: String,
        color: Color,
    },
    DiceRolled {
        player: String,
        value: u8,
        next_turn: String,
    },
}

impl GameEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlayerJoined { .. } => "playerJoined",
            Self::PlayerLeft { .. } => "playerLeft",
            Self::DiceRolled { .. } => "diceRolled",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::PlayerJoined { player, color } => serde_json::json!({
                "event": self.kind(),
                "player": player,
                "color": color.as_str()
            }),
            Self::PlayerLeft { player, color } => serde_json::json!({
                "event": self.kind(),
                "player": player,
                "color": color.as_str()
            }),
            Self::DiceRolled {
                player,
                value,
                next_turn,
            } => serde_json::json!({
                "event": self.kind(),
                "player": player,
                "value": value,
                "nextTurn": next_turn
            }),
        }
    }
}

/// Event fan-out for one game.
///
/// Scoped to the game's lifetime; dropping the game drops every sender
/// and subscribers observe a disconnect.
#[derive(Debug, Default)]
pub struct NotificationChannel {
    subscribers: Vec<flume::Sender<GameEvent>>,
}

impl NotificationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and return its receiving end.
    pub fn subscribe(&mut self) -> flume::Receiver<GameEvent> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver an event to every live subscriber.
    ///
    /// Subscribers whose receiver is gone are pruned here.
    pub fn publish(&mut self, event: GameEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
