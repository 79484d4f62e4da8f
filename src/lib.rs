//! Ludo State Library
//!
//! This crate provides session and turn state management for Ludo game logic.
//!
//! # Overview
//!
//! The session module provides:
//!
//! - **Game Registry** - Named sessions with create/join/leave, a joinable-games
//!   listing, and deletion once the last player leaves.
//!
//! - **Turn Engine** - Dice-driven round-robin turns; the first roll flips a
//!   session from waiting to in-progress and locks the roster.
//!
//! - **Color Assignment** - Fixed four-color palette handed out lowest-free-first,
//!   with released colors going back into the pool.
//!
//! - **Roll Log & Events** - Chronological dice log per game, plus a channel
//!   broadcasting joins, leaves, and rolls to subscribers.
//!
//! # Design Principles
//!
//! 1. **Operations validate state** - Wrong-phase joins, off-turn rolls, and
//!    capacity violations are rejected with typed errors.
//!
//! 2. **One lock per game** - The registry table and each game lock independently,
//!    so activity in one session never blocks another.
//!
//! 3. **No networking** - This crate is pure state, no HTTP or WebSocket.
//!
//! 4. **Deterministic under test** - Dice sit behind a trait seam; tests inject
//!    fixed rolls and assert exact outcomes.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use ludo_state::session::{FixedDice, GameRegistry};
//!
//! let registry = GameRegistry::with_dice(Arc::new(FixedDice::always(4)));
//!
//! // Creating a game joins the creator in the same step
//! let host = registry.create_game("ludo", "dhana").unwrap();
//! assert_eq!(host.color.as_str(), "red");
//!
//! registry.join_game("ludo", "joy").unwrap();
//!
//! // First roll starts the game and passes the turn on
//! let roll = registry.roll_dice("ludo", "dhana").unwrap();
//! assert_eq!(roll.value, 4);
//! assert_eq!(roll.next_turn, "joy");
//!
//! // Started games drop out of the joinable listing
//! assert!(registry.available_games().is_empty());
//! ```

pub mod session;

// Re-export everything from session module at crate root
pub use session::*;
