//! Game state machine.
//!
//! One `Game` is a single named session: its roster in join order, the
//! color each player holds, the phase, the turn pointer, and the roll
//! log. Join order is turn order, and the player at index 0 is the
//! session's creator.

use std::fmt;
use std::sync::Arc;

use crate::session::colors::{Color, ColorSource};
use crate::session::dice::DiceSource;
use crate::session::events::{GameEvent, NotificationChannel};
use crate::session::log::TurnLog;

/// Maximum players per game.
pub const GAME_CAPACITY: usize = 4;

/// Coarse session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Accepting players
    #[default]
    Waiting,
    /// Turns underway
    InProgress,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::InProgress => "in_progress",
        }
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

/// A player joined to a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Display name; unique within the game, case-sensitive
    pub name: String,

    /// Identity color held for the lifetime of the membership
    pub color: Color,

    /// When the player joined
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl Player {
    pub fn new(name: &str, color: Color) -> Self {
        Self {
            name: name.to_string(),
            color,
            joined_at: chrono::Utc::now(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "color": self.color.as_str()
        })
    }
}

/// Read-only roster view, copied out under the game lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterSnapshot {
    pub game: String,
    pub phase: Phase,
    pub players: Vec<Player>,
    pub remaining: usize,
    pub created_by: Option<String>,
    pub current_turn: Option<String>,
}

impl RosterSnapshot {
    pub fn to_json(&self) -> serde_json::Value {
        let players: Vec<serde_json::Value> = self.players.iter().map(|p| p.to_json()).collect();
        serde_json::json!({
            "gameName": self.game,
            "phase": self.phase.as_str(),
            "players": players,
            "remain": self.remaining,
            "createdBy": self.created_by,
            "currentTurn": self.current_turn
        })
    }
}

/// Read-only turn view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSnapshot {
    pub phase: Phase,
    pub current_turn: Option<String>,
}

impl TurnSnapshot {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "phase": self.phase.as_str(),
            "currentTurn": self.current_turn
        })
    }
}

/// Outcome of one dice roll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceRoll {
    /// Face value rolled
    pub value: u8,

    /// Player whose turn is next
    pub next_turn: String,
}

impl DiceRoll {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "value": self.value,
            "nextTurn": self.next_turn
        })
    }
}

/// A single game session.
///
/// Owns its roster, color source, roll log, and notification channel.
/// The registry wraps each game in its own lock; nothing here blocks.
#[derive(Debug)]
pub struct Game {
    name: String,

    /// Roster in join order; join order is turn order
    players: Vec<Player>,

    phase: Phase,

    /// Index into `players`; meaningful while the roster is non-empty
    current_turn: usize,

    colors: Box<dyn ColorSource>,

    dice: Arc<dyn DiceSource>,

    log: TurnLog,

    channel: NotificationChannel,

    created_at: chrono::DateTime<chrono::Utc>,

    /// Set when the registry unregisters the game, so a caller holding
    /// a stale handle cannot mutate a detached session
    closed: bool,
}

impl Game {
    /// Create an empty game in phase Waiting.
    pub fn new(name: String, colors: Box<dyn ColorSource>, dice: Arc<dyn DiceSource>) -> Self {
        Self {
            name,
            players: Vec::new(),
            phase: Phase::Waiting,
            current_turn: 0,
            colors,
            dice,
            log: TurnLog::new(),
            channel: NotificationChannel::new(),
            created_at: chrono::Utc::now(),
            closed: false,
        }
    }

    /// Add a player, binding them the lowest free color.
    ///
    /// Capacity is checked before anything else, so joining a full game
    /// fails `Full` whatever the name.
    pub fn join(&mut self, name: &str) -> Result<Color, GameError> {
        if self.closed {
            return Err(GameError::Closed);
        }
        if self.is_full() {
            return Err(GameError::Full);
        }
        if self.phase.is_in_progress() {
            return Err(GameError::AlreadyStarted);
        }
        if self.has_player(name) {
            return Err(GameError::NameTaken);
        }

        // Capacity was checked above, so a color must be free
        let color = self
            .colors
            .acquire()
            .expect("palette holds a free color while below capacity");

        self.players.push(Player::new(name, color));
        self.channel.publish(GameEvent::PlayerJoined {
            player: name.to_string(),
            color,
        });

        Ok(color)
    }

    /// Remove a player and reclaim their color.
    ///
    /// If the leaver held the current turn, the turn passes to the next
    /// player in join order, wrapping past the end. The caller is
    /// responsible for deleting the game once the roster empties.
    pub fn leave(&mut self, name: &str) -> Result<Player, GameError> {
        if self.closed {
            return Err(GameError::Closed);
        }
        let idx = self
            .players
            .iter()
            .position(|p| p.name == name)
            .ok_or(GameError::UnknownPlayer)?;

        let player = self.players.remove(idx);
        self.colors.release(player.color);

        if self.players.is_empty() {
            // No roster, no turn
            self.current_turn = 0;
        } else if idx < self.current_turn {
            // Keep pointing at the same player
            self.current_turn -= 1;
        } else if idx == self.current_turn {
            // Removal shifted the next player into this slot; wrap if
            // the leaver was last
            self.current_turn %= self.players.len();
        }

        self.channel.publish(GameEvent::PlayerLeft {
            player: player.name.clone(),
            color: player.color,
        });

        Ok(player)
    }

    /// Roll the dice for `player` and pass the turn on.
    ///
    /// Turn order is strict: only the player under the turn pointer may
    /// roll, and anyone else gets `NotYourTurn`. The first roll (which
    /// only the creator can make) moves the game out of Waiting; there
    /// is no separate start action.
    pub fn roll_dice(&mut self, player: &str) -> Result<DiceRoll, GameError> {
        if self.closed {
            return Err(GameError::Closed);
        }
        let idx = self
            .players
            .iter()
            .position(|p| p.name == player)
            .ok_or(GameError::UnknownPlayer)?;
        if idx != self.current_turn {
            return Err(GameError::NotYourTurn);
        }

        if self.phase.is_waiting() {
            self.phase = Phase::InProgress;
        }

        let value = self.dice.roll();
        self.log.record(player, value);
        self.current_turn = (self.current_turn + 1) % self.players.len();
        let next_turn = self.players[self.current_turn].name.clone();

        self.channel.publish(GameEvent::DiceRolled {
            player: player.to_string(),
            value,
            next_turn: next_turn.clone(),
        });

        Ok(DiceRoll { value, next_turn })
    }

    /// Roster snapshot for waiting-room pollers.
    pub fn status(&self) -> RosterSnapshot {
        RosterSnapshot {
            game: self.name.clone(),
            phase: self.phase,
            players: self.players.clone(),
            remaining: self.remaining_capacity(),
            created_by: self.created_by().map(str::to_string),
            current_turn: self.current_player().map(|p| p.name.clone()),
        }
    }

    /// Turn snapshot for board pollers.
    pub fn turn_status(&self) -> TurnSnapshot {
        TurnSnapshot {
            phase: self.phase,
            current_turn: self.current_player().map(|p| p.name.clone()),
        }
    }

    /// Player holding the turn; defined once the game is in progress.
    pub fn current_player(&self) -> Option<&Player> {
        if self.phase.is_in_progress() {
            self.players.get(self.current_turn)
        } else {
            None
        }
    }

    /// Name of the player who created the session.
    pub fn created_by(&self) -> Option<&str> {
        self.players.first().map(|p| p.name.as_str())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Roster in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn remaining_capacity(&self) -> usize {
        GAME_CAPACITY - self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= GAME_CAPACITY
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn has_player(&self, name: &str) -> bool {
        self.players.iter().any(|p| p.name == name)
    }

    /// The game's roll log.
    pub fn log(&self) -> &TurnLog {
        &self.log
    }

    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.created_at
    }

    /// Subscribe to this game's events.
    pub fn subscribe(&mut self) -> flume::Receiver<GameEvent> {
        self.channel.subscribe()
    }

    /// Mark the game as unregistered; later mutations fail `Closed`.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Game errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    Full,
    AlreadyStarted,
    NameTaken,
    UnknownPlayer,
    NotYourTurn,
    Closed,
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "Game is full"),
            Self::AlreadyStarted => write!(f, "Game has already started"),
            Self::NameTaken => write!(f, "Player name already taken in this game"),
            Self::UnknownPlayer => write!(f, "No such player in this game"),
            Self::NotYourTurn => write!(f, "It's not your turn"),
            Self::Closed => write!(f, "Game has been closed"),
        }
    }
}

impl std::error::Error for GameError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::colors::ColorAssigner;
    use crate::session::dice::FixedDice;
    use pretty_assertions::assert_eq;

    fn make_game() -> Game {
        make_game_with_dice(Arc::new(FixedDice::always(4)))
    }

    fn make_game_with_dice(dice: Arc<dyn DiceSource>) -> Game {
        Game::new("ludo".to_string(), Box::new(ColorAssigner::new()), dice)
    }

    #[test]
    fn test_game_new() {
        let game = make_game();

        assert_eq!(game.phase(), Phase::Waiting);
        assert!(game.is_empty());
        assert_eq!(game.remaining_capacity(), GAME_CAPACITY);
        assert_eq!(game.created_by(), None);
        assert!(game.current_player().is_none());
    }

    #[test]
    fn test_join_assigns_palette_colors_in_order() {
        let mut game = make_game();

        assert_eq!(game.join("p1").unwrap(), Color::Red);
        assert_eq!(game.join("p2").unwrap(), Color::Green);
        assert_eq!(game.join("p3").unwrap(), Color::Yellow);
        assert_eq!(game.join("p4").unwrap(), Color::Blue);

        assert_eq!(game.created_by(), Some("p1"));
        assert_eq!(game.player_count(), 4);
        assert_eq!(game.remaining_capacity(), 0);
    }

    #[test]
    fn test_join_full() {
        let mut game = make_game();
        for name in ["p1", "p2", "p3", "p4"] {
            game.join(name).unwrap();
        }

        assert_eq!(game.join("p5"), Err(GameError::Full));
        // Full wins even when the name is already taken
        assert_eq!(game.join("p1"), Err(GameError::Full));
        assert_eq!(game.player_count(), 4);
    }

    #[test]
    fn test_join_name_taken() {
        let mut game = make_game();
        game.join("p1").unwrap();
        game.join("p2").unwrap();
        game.join("p3").unwrap();

        assert_eq!(game.join("p1"), Err(GameError::NameTaken));
        assert_eq!(game.player_count(), 3);
    }

    #[test]
    fn test_join_after_start() {
        let mut game = make_game();
        game.join("p1").unwrap();
        game.join("p2").unwrap();
        game.roll_dice("p1").unwrap();

        assert_eq!(game.join("p3"), Err(GameError::AlreadyStarted));
    }

    #[test]
    fn test_leave_releases_color() {
        let mut game = make_game();
        game.join("p1").unwrap();
        game.join("p2").unwrap();

        let left = game.leave("p1").unwrap();
        assert_eq!(left.color, Color::Red);
        assert!(!game.has_player("p1"));

        // Freed color goes to the next joiner
        assert_eq!(game.join("p3").unwrap(), Color::Red);
    }

    #[test]
    fn test_leave_unknown_player() {
        let mut game = make_game();
        game.join("p1").unwrap();

        assert_eq!(game.leave("ghost"), Err(GameError::UnknownPlayer));
        assert_eq!(game.player_count(), 1);
    }

    #[test]
    fn test_join_then_leave_restores_state() {
        let mut game = make_game();
        game.join("p1").unwrap();

        game.join("p2").unwrap();
        game.leave("p2").unwrap();

        assert_eq!(game.player_count(), 1);
        assert_eq!(game.join("p3").unwrap(), Color::Green);
    }

    #[test]
    fn test_leave_before_pointer_keeps_turn() {
        let mut game = make_game();
        game.join("p1").unwrap();
        game.join("p2").unwrap();
        game.join("p3").unwrap();
        game.roll_dice("p1").unwrap(); // turn now on p2

        game.leave("p1").unwrap();

        assert_eq!(game.current_player().unwrap().name, "p2");
    }

    #[test]
    fn test_leave_of_turn_holder_advances() {
        let mut game = make_game();
        game.join("p1").unwrap();
        game.join("p2").unwrap();
        game.join("p3").unwrap();
        game.roll_dice("p1").unwrap(); // turn now on p2

        game.leave("p2").unwrap();

        assert_eq!(game.current_player().unwrap().name, "p3");
    }

    #[test]
    fn test_leave_of_last_slot_wraps_pointer() {
        let mut game = make_game();
        game.join("p1").unwrap();
        game.join("p2").unwrap();
        game.join("p3").unwrap();
        game.roll_dice("p1").unwrap();
        game.roll_dice("p2").unwrap(); // turn now on p3

        game.leave("p3").unwrap();

        assert_eq!(game.current_player().unwrap().name, "p1");
    }

    #[test]
    fn test_leave_after_pointer_keeps_turn() {
        let mut game = make_game();
        game.join("p1").unwrap();
        game.join("p2").unwrap();
        game.join("p3").unwrap();
        game.roll_dice("p1").unwrap(); // turn now on p2

        game.leave("p3").unwrap();

        assert_eq!(game.current_player().unwrap().name, "p2");
    }

    #[test]
    fn test_pointer_repair_across_consecutive_leaves() {
        let mut game = make_game();
        game.join("p1").unwrap();
        game.join("p2").unwrap();
        game.join("p3").unwrap();
        game.join("p4").unwrap();
        game.roll_dice("p1").unwrap();
        game.roll_dice("p2").unwrap(); // turn now on p3

        game.leave("p2").unwrap();
        assert_eq!(game.current_player().unwrap().name, "p3");

        game.leave("p3").unwrap();
        assert_eq!(game.current_player().unwrap().name, "p4");

        // Rotation continues over the two survivors
        let roll = game.roll_dice("p4").unwrap();
        assert_eq!(roll.next_turn, "p1");
        assert_eq!(game.current_player().unwrap().name, "p1");
    }

    #[test]
    fn test_first_roll_starts_game() {
        let mut game = make_game();
        game.join("p1").unwrap();
        game.join("p2").unwrap();
        assert_eq!(game.phase(), Phase::Waiting);

        game.roll_dice("p1").unwrap();

        assert_eq!(game.phase(), Phase::InProgress);
        assert_eq!(game.current_player().unwrap().name, "p2");
    }

    #[test]
    fn test_roll_out_of_turn_rejected() {
        let mut game = make_game();
        game.join("p1").unwrap();
        game.join("p2").unwrap();

        // Only the creator may open play
        assert_eq!(game.roll_dice("p2"), Err(GameError::NotYourTurn));
        assert_eq!(game.phase(), Phase::Waiting);
        assert!(game.log().is_empty());

        game.roll_dice("p1").unwrap();
        assert_eq!(game.roll_dice("p1"), Err(GameError::NotYourTurn));
        assert_eq!(game.log().len(), 1);
    }

    #[test]
    fn test_roll_unknown_player() {
        let mut game = make_game();
        game.join("p1").unwrap();

        assert_eq!(game.roll_dice("ghost"), Err(GameError::UnknownPlayer));
    }

    #[test]
    fn test_roll_advances_round_robin() {
        let mut game = make_game();
        game.join("p1").unwrap();
        game.join("p2").unwrap();

        let roll = game.roll_dice("p1").unwrap();
        assert_eq!(roll.value, 4);
        assert_eq!(roll.next_turn, "p2");
        assert_eq!(game.log().len(), 1);

        // Wraps back past the last roster entry
        let roll = game.roll_dice("p2").unwrap();
        assert_eq!(roll.next_turn, "p1");
        assert_eq!(game.log().len(), 2);
    }

    #[test]
    fn test_roll_values_follow_dice_sequence() {
        let mut game = make_game_with_dice(Arc::new(FixedDice::sequence(vec![6, 2])));
        game.join("p1").unwrap();
        game.join("p2").unwrap();

        assert_eq!(game.roll_dice("p1").unwrap().value, 6);
        assert_eq!(game.roll_dice("p2").unwrap().value, 2);
        assert_eq!(game.roll_dice("p1").unwrap().value, 6);

        let values: Vec<u8> = game.log().entries().map(|e| e.value).collect();
        assert_eq!(values, vec![6, 2, 6]);
    }

    #[test]
    fn test_log_sequence_survives_roster_churn() {
        let mut game = make_game();
        game.join("p1").unwrap();
        game.join("p2").unwrap();
        game.join("p3").unwrap();

        game.roll_dice("p1").unwrap();
        game.leave("p2").unwrap();
        game.roll_dice("p3").unwrap();

        let seqs: Vec<u64> = game.log().entries().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn test_status_snapshot() {
        let mut game = make_game();
        game.join("dhana").unwrap();
        game.join("joy").unwrap();

        let status = game.status();
        assert_eq!(status.game, "ludo");
        assert_eq!(status.phase, Phase::Waiting);
        assert_eq!(status.remaining, 2);
        assert_eq!(status.created_by.as_deref(), Some("dhana"));
        assert_eq!(status.current_turn, None);

        game.roll_dice("dhana").unwrap();

        let status = game.status();
        assert_eq!(status.phase, Phase::InProgress);
        assert_eq!(status.current_turn.as_deref(), Some("joy"));
    }

    #[test]
    fn test_status_json_shape() {
        let mut game = make_game();
        game.join("dhana").unwrap();

        assert_eq!(
            game.status().to_json(),
            serde_json::json!({
                "gameName": "ludo",
                "phase": "waiting",
                "players": [{"name": "dhana", "color": "red"}],
                "remain": 3,
                "createdBy": "dhana",
                "currentTurn": null
            })
        );
    }

    #[test]
    fn test_events_published_on_mutations() {
        let mut game = make_game();
        let rx = game.subscribe();

        game.join("p1").unwrap();
        game.join("p2").unwrap();
        game.roll_dice("p1").unwrap();
        game.leave("p2").unwrap();

        let kinds: Vec<&str> = rx.try_iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec!["playerJoined", "playerJoined", "diceRolled", "playerLeft"]
        );
    }

    #[test]
    fn test_closed_game_rejects_mutations() {
        let mut game = make_game();
        game.join("p1").unwrap();
        game.close();

        assert_eq!(game.join("p2"), Err(GameError::Closed));
        assert_eq!(game.leave("p1"), Err(GameError::Closed));
        assert_eq!(game.roll_dice("p1"), Err(GameError::Closed));
        assert!(game.is_closed());
    }
}
