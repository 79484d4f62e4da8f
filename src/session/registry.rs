//! Game registry.
//!
//! The process-wide table of active games, keyed by session name. The
//! registry owns creation, lookup, deletion, and listing, and carries
//! the whole caller-facing contract: name validation, join/leave,
//! status queries, dice rolls, and log reads.
//!
//! Construct one registry at process start and hand it (behind an
//! `Arc`) to every request-handling unit; it is not a global.
//!
//! # Locking
//!
//! The table sits behind its own `RwLock`, each game behind its own
//! `Mutex`, so activity inside one session never contends with
//! creating or deleting another. Locks are always taken registry
//! first, game second. The empty-roster deletion path re-checks both
//! emptiness and handle identity under that order before removing, so
//! a racing join or a reused name is never clobbered.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use crate::session::colors::{Color, ColorAssigner};
use crate::session::dice::{DiceSource, RandomDice};
use crate::session::events::GameEvent;
use crate::session::game::{DiceRoll, Game, GameError, RosterSnapshot, TurnSnapshot};
use crate::session::log::LogEntry;

/// Maximum length of a session name, in characters.
pub const MAX_GAME_NAME_LEN: usize = 15;

/// Maximum length of a player name, in characters.
pub const MAX_PLAYER_NAME_LEN: usize = 8;

/// Why a submitted name was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    Empty,
    TooLong { len: usize, max: usize },
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Name is empty"),
            Self::TooLong { len, max } => {
                write!(f, "Name is {} characters, max {}", len, max)
            }
        }
    }
}

impl std::error::Error for NameError {}

/// Registry-level errors, the caller-facing error surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Submitted name failed validation
    InvalidName(NameError),
    /// Session name collision on create
    AlreadyExists,
    /// No session registered under that name
    NotFound,
    Full,
    AlreadyStarted,
    NameTaken,
    /// Session exists but the named player is not in it
    UnknownPlayer,
    NotYourTurn,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName(e) => write!(f, "Invalid name: {}", e),
            Self::AlreadyExists => write!(f, "Game name already taken"),
            Self::NotFound => write!(f, "Game doesn't exist"),
            Self::Full => write!(f, "Game is full"),
            Self::AlreadyStarted => write!(f, "Game has already started"),
            Self::NameTaken => write!(f, "Player name already taken in this game"),
            Self::UnknownPlayer => write!(f, "No such player in this game"),
            Self::NotYourTurn => write!(f, "It's not your turn"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<NameError> for SessionError {
    fn from(e: NameError) -> Self {
        Self::InvalidName(e)
    }
}

impl From<GameError> for SessionError {
    fn from(e: GameError) -> Self {
        match e {
            GameError::Full => Self::Full,
            GameError::AlreadyStarted => Self::AlreadyStarted,
            GameError::NameTaken => Self::NameTaken,
            GameError::UnknownPlayer => Self::UnknownPlayer,
            GameError::NotYourTurn => Self::NotYourTurn,
            // A closed game has been unregistered; to the caller it is gone
            GameError::Closed => Self::NotFound,
        }
    }
}

/// Identity handed back when a player enters a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedIdentity {
    pub game: String,
    pub player: String,
    pub color: Color,
}

impl AssignedIdentity {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "gameName": self.game,
            "playerName": self.player,
            "color": self.color.as_str()
        })
    }
}

/// One row of the joinable-games listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableGame {
    pub name: String,
    pub remaining: usize,
    pub created_by: String,
}

impl AvailableGame {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "remain": self.remaining,
            "createdBy": self.created_by
        })
    }
}

/// Trim and length-check a submitted name.
fn validate_name(raw: &str, max: usize) -> Result<&str, NameError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    let len = name.chars().count();
    if len > max {
        return Err(NameError::TooLong { len, max });
    }
    Ok(name)
}

fn validate_game_name(raw: &str) -> Result<&str, NameError> {
    validate_name(raw, MAX_GAME_NAME_LEN)
}

fn validate_player_name(raw: &str) -> Result<&str, NameError> {
    validate_name(raw, MAX_PLAYER_NAME_LEN)
}

/// Registered games plus their registration order.
#[derive(Debug, Default)]
struct Table {
    games: HashMap<String, Arc<Mutex<Game>>>,

    /// Registration order, for stable listing
    order: Vec<String>,
}

impl Table {
    fn get(&self, name: &str) -> Option<&Arc<Mutex<Game>>> {
        self.games.get(name)
    }

    fn insert(&mut self, name: String, game: Arc<Mutex<Game>>) {
        self.order.push(name.clone());
        self.games.insert(name, game);
    }

    fn remove(&mut self, name: &str) -> Option<Arc<Mutex<Game>>> {
        let game = self.games.remove(name)?;
        self.order.retain(|n| n != name);
        Some(game)
    }

    fn iter_in_order(&self) -> impl Iterator<Item = (&String, &Arc<Mutex<Game>>)> {
        self.order
            .iter()
            .filter_map(|name| self.games.get(name).map(|game| (name, game)))
    }

    fn len(&self) -> usize {
        self.games.len()
    }
}

/// Registry of active game sessions.
#[derive(Debug)]
pub struct GameRegistry {
    table: RwLock<Table>,

    /// Dice shared by every game this registry creates
    dice: Arc<dyn DiceSource>,
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRegistry {
    /// Registry rolling production random dice.
    pub fn new() -> Self {
        Self::with_dice(Arc::new(RandomDice::new()))
    }

    /// Registry rolling the given dice; tests pass deterministic ones.
    pub fn with_dice(dice: Arc<dyn DiceSource>) -> Self {
        Self {
            table: RwLock::new(Table::default()),
            dice,
        }
    }

    /// Create a session and join its creator, atomically.
    ///
    /// Fails `AlreadyExists` without touching the registered game.
    pub fn create_game(
        &self,
        game_name: &str,
        player_name: &str,
    ) -> Result<AssignedIdentity, SessionError> {
        let game_name = validate_game_name(game_name)?;
        let player_name = validate_player_name(player_name)?;

        let mut table = self.table.write().expect("registry lock poisoned");
        if table.get(game_name).is_some() {
            tracing::debug!("Rejected create for '{}': name already registered", game_name);
            return Err(SessionError::AlreadyExists);
        }

        let mut game = Game::new(
            game_name.to_string(),
            Box::new(ColorAssigner::new()),
            self.dice.clone(),
        );
        let color = game
            .join(player_name)
            .expect("creator joins an empty game");
        table.insert(game_name.to_string(), Arc::new(Mutex::new(game)));

        tracing::info!("Game '{}' created by '{}'", game_name, player_name);

        Ok(AssignedIdentity {
            game: game_name.to_string(),
            player: player_name.to_string(),
            color,
        })
    }

    /// Join an existing session.
    pub fn join_game(
        &self,
        game_name: &str,
        player_name: &str,
    ) -> Result<AssignedIdentity, SessionError> {
        let game_name = validate_game_name(game_name)?;
        let player_name = validate_player_name(player_name)?;

        let game = self.get(game_name).ok_or(SessionError::NotFound)?;
        let mut guard = game.lock().expect("game lock poisoned");
        let color = match guard.join(player_name) {
            Ok(color) => color,
            Err(e) => {
                tracing::debug!(
                    "Rejected join of '{}' to game '{}': {}",
                    player_name,
                    game_name,
                    e
                );
                return Err(e.into());
            }
        };
        drop(guard);

        tracing::info!(
            "Player '{}' joined game '{}' as {}",
            player_name,
            game_name,
            color
        );

        Ok(AssignedIdentity {
            game: game_name.to_string(),
            player: player_name.to_string(),
            color,
        })
    }

    /// Remove a player from a session.
    ///
    /// Deletes the session once its roster empties; the name becomes
    /// immediately reusable.
    pub fn leave_game(&self, game_name: &str, player_name: &str) -> Result<(), SessionError> {
        let game = self.get(game_name).ok_or(SessionError::NotFound)?;

        let now_empty = {
            let mut guard = game.lock().expect("game lock poisoned");
            guard.leave(player_name)?;
            guard.is_empty()
        };

        tracing::info!("Player '{}' left game '{}'", player_name, game_name);

        if now_empty {
            self.remove_if_empty(game_name, &game);
        }

        Ok(())
    }

    /// Delete `game_name` if it still maps to `handle` and is still
    /// empty. Both conditions are re-checked under registry-then-game
    /// locking: a player may have joined since the caller looked, or
    /// the name may already belong to a newer game.
    fn remove_if_empty(&self, game_name: &str, handle: &Arc<Mutex<Game>>) {
        let mut table = self.table.write().expect("registry lock poisoned");
        let Some(current) = table.get(game_name) else {
            return;
        };
        if !Arc::ptr_eq(current, handle) {
            return;
        }

        let mut guard = handle.lock().expect("game lock poisoned");
        if !guard.is_empty() {
            return;
        }
        guard.close();
        drop(guard);

        table.remove(game_name);
        tracing::info!("Game '{}' deleted, name free for reuse", game_name);
    }

    /// Every session still accepting players, in registration order.
    pub fn available_games(&self) -> Vec<AvailableGame> {
        let table = self.table.read().expect("registry lock poisoned");
        table
            .iter_in_order()
            .filter_map(|(name, game)| {
                let guard = game.lock().expect("game lock poisoned");
                if !guard.phase().is_waiting() {
                    return None;
                }
                let created_by = guard.created_by()?.to_string();
                Some(AvailableGame {
                    name: name.clone(),
                    remaining: guard.remaining_capacity(),
                    created_by,
                })
            })
            .collect()
    }

    /// Roster snapshot for a session member.
    ///
    /// The caller must name a player in the roster; this is how the
    /// transport validates a stored game/player binding.
    pub fn waiting_status(
        &self,
        game_name: &str,
        player_name: &str,
    ) -> Result<RosterSnapshot, SessionError> {
        let game = self.get(game_name).ok_or(SessionError::NotFound)?;
        let guard = game.lock().expect("game lock poisoned");
        if !guard.has_player(player_name) {
            return Err(SessionError::UnknownPlayer);
        }
        Ok(guard.status())
    }

    /// Phase and current turn of a session.
    pub fn game_status(&self, game_name: &str) -> Result<TurnSnapshot, SessionError> {
        let game = self.get(game_name).ok_or(SessionError::NotFound)?;
        let guard = game.lock().expect("game lock poisoned");
        Ok(guard.turn_status())
    }

    /// Roll the dice for a player in a session.
    pub fn roll_dice(
        &self,
        game_name: &str,
        player_name: &str,
    ) -> Result<DiceRoll, SessionError> {
        let game = self.get(game_name).ok_or(SessionError::NotFound)?;
        let roll = {
            let mut guard = game.lock().expect("game lock poisoned");
            guard.roll_dice(player_name)?
        };

        tracing::debug!(
            "Player '{}' rolled {} in game '{}', next turn '{}'",
            player_name,
            roll.value,
            game_name,
            roll.next_turn
        );

        Ok(roll)
    }

    /// Copy of a session's roll log, oldest first.
    pub fn logs(&self, game_name: &str) -> Result<Vec<LogEntry>, SessionError> {
        let game = self.get(game_name).ok_or(SessionError::NotFound)?;
        let guard = game.lock().expect("game lock poisoned");
        Ok(guard.log().snapshot())
    }

    /// Subscribe to a session's event stream.
    pub fn subscribe(&self, game_name: &str) -> Result<flume::Receiver<GameEvent>, SessionError> {
        let game = self.get(game_name).ok_or(SessionError::NotFound)?;
        let mut guard = game.lock().expect("game lock poisoned");
        Ok(guard.subscribe())
    }

    /// Remove a session outright. No-op if the name is not registered.
    pub fn delete(&self, game_name: &str) {
        let mut table = self.table.write().expect("registry lock poisoned");
        if let Some(game) = table.remove(game_name) {
            game.lock().expect("game lock poisoned").close();
            tracing::info!("Game '{}' deleted", game_name);
        }
    }

    /// Shared handle to a registered game.
    pub fn get(&self, name: &str) -> Option<Arc<Mutex<Game>>> {
        let table = self.table.read().expect("registry lock poisoned");
        table.get(name).cloned()
    }

    /// Check a stored game/player binding in one call.
    pub fn is_member(&self, game_name: &str, player_name: &str) -> bool {
        match self.get(game_name) {
            Some(game) => game
                .lock()
                .expect("game lock poisoned")
                .has_player(player_name),
            None => false,
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        let table = self.table.read().expect("registry lock poisoned");
        table.get(name).is_some()
    }

    /// Count registered sessions.
    pub fn count(&self) -> usize {
        let table = self.table.read().expect("registry lock poisoned");
        table.len()
    }
}
