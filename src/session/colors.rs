//! Color assignment.
//!
//! Each player in a game holds one color from a fixed four-slot palette.
//! The assigner hands out the lowest free color on join and reclaims it
//! on leave, so no two players in the same game ever share one.

use std::fmt;

/// The fixed palette, in hand-out order.
pub const PALETTE: [Color; 4] = [Color::Red, Color::Green, Color::Yellow, Color::Blue];

/// A player's identity color within a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
        }
    }

    /// Position of this color in the palette.
    pub fn index(&self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Yellow => 2,
            Self::Blue => 3,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when no palette slot is free.
///
/// The game checks capacity before asking for a color, so seeing this
/// escape means an invariant was broken somewhere upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteExhausted;

impl fmt::Display for PaletteExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No free color in the palette")
    }
}

impl std::error::Error for PaletteExhausted {}

/// Source of identity colors for one game.
///
/// Narrow seam so tests can substitute their own distribution. Callers
/// follow a one-acquire-one-release discipline per player.
pub trait ColorSource: fmt::Debug + Send {
    /// Hand out the lowest free color.
    fn acquire(&mut self) -> Result<Color, PaletteExhausted>;

    /// Return a color to the free pool.
    fn release(&mut self, color: Color);
}

/// Standard palette-backed color source.
///
/// Every slot starts free when its owning game is created.
#[derive(Debug, Default)]
pub struct ColorAssigner {
    held: [bool; PALETTE.len()],
}

impl ColorAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count colors still free.
    pub fn free_count(&self) -> usize {
        self.held.iter().filter(|h| !**h).count()
    }

    /// Check whether a color is currently held.
    pub fn is_held(&self, color: Color) -> bool {
        self.held[color.index()]
    }
}

impl ColorSource for ColorAssigner {
    fn acquire(&mut self) -> Result<Color, PaletteExhausted> {
        for (i, color) in PALETTE.iter().enumerate() {
            if !self.held[i] {
                self.held[i] = true;
                return Ok(*color);
            }
        }
        Err(PaletteExhausted)
    }

    fn release(&mut self, color: Color) {
        self.held[color.index()] = false;
    }
}
