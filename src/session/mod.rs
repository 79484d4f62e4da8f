//! Session management module for ludo-state.
//!
//! This module provides the core session types and the registry:
//!
//! - `colors` - Token color palette and per-game assignment
//! - `dice` - Dice abstraction (random in production, fixed in tests)
//! - `events` - Per-game notification channel
//! - `game` - One session: roster, phase, turn order, dice, log
//! - `log` - Chronological dice-roll log
//! - `registry` - Named table of live games, the caller-facing API
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        GameRegistry                          │
//! │                                                              │
//! │   RwLock<Table>:  name → Arc<Mutex<Game>>  (+ listing order) │
//! │                                                              │
//! │   ┌───────────────────── Game ─────────────────────────┐     │
//! │   │                                                    │     │
//! │   │  players: Vec<Player>       phase:                 │     │
//! │   │  current_turn (rotor)       Waiting ──▶ InProgress │     │
//! │   │                                                    │     │
//! │   │  ColorAssigner   DiceSource   TurnLog   Channel    │     │
//! │   │  (red→green→     (random or   (roll     (flume     │     │
//! │   │   yellow→blue)    fixed)       history)  events)   │     │
//! │   └────────────────────────────────────────────────────┘     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use ludo_state::session::{GameRegistry, SessionError};
//!
//! let registry = GameRegistry::new();
//!
//! // Creating joins the creator in the same step
//! let identity = registry.create_game("ludo", "dhana")?;
//! registry.join_game("ludo", "joy")?;
//!
//! // First roll starts the game; turns then rotate in join order
//! let roll = registry.roll_dice("ludo", "dhana")?;
//! println!("rolled {}, next up {}", roll.value, roll.next_turn);
//! ```

pub mod colors;
pub mod dice;
pub mod events;
pub mod game;
pub mod log;
pub mod registry;

// Re-export commonly used types
pub use colors::{Color, ColorAssigner, ColorSource, PaletteExhausted, PALETTE};
pub use dice::{DiceSource, FixedDice, RandomDice, DICE_MAX, DICE_MIN};
pub use events::{GameEvent, NotificationChannel};
pub use game::{
    DiceRoll, Game, GameError, Phase, Player, RosterSnapshot, TurnSnapshot, GAME_CAPACITY,
};
pub use log::{LogEntry, TurnLog};
pub use registry::{
    AssignedIdentity, AvailableGame, GameRegistry, NameError, SessionError, MAX_GAME_NAME_LEN,
    MAX_PLAYER_NAME_LEN,
};
