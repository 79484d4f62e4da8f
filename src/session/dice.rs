//! Dice sources.
//!
//! Games draw turn values through the `DiceSource` trait so tests can
//! substitute deterministic dice for the production random ones.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

/// Lowest face value.
pub const DICE_MIN: u8 = 1;

/// Highest face value.
pub const DICE_MAX: u8 = 6;

/// Source of dice values in `DICE_MIN..=DICE_MAX`.
///
/// One source may be shared by every game in a registry, so rolling
/// takes `&self` and implementations must be thread-safe.
pub trait DiceSource: fmt::Debug + Send + Sync {
    /// Produce the next dice value.
    fn roll(&self) -> u8;
}

/// Production dice drawing uniformly from the thread-local generator.
#[derive(Debug, Default)]
pub struct RandomDice;

impl RandomDice {
    pub fn new() -> Self {
        Self
    }
}

impl DiceSource for RandomDice {
    fn roll(&self) -> u8 {
        rand::rng().random_range(DICE_MIN..=DICE_MAX)
    }
}

/// Deterministic dice for tests.
///
/// Yields a fixed value, or cycles through a fixed sequence.
#[derive(Debug)]
pub struct FixedDice {
    values: Vec<u8>,
    cursor: AtomicUsize,
}

impl FixedDice {
    /// Dice that always land on `value`.
    pub fn always(value: u8) -> Self {
        Self::sequence(vec![value])
    }

    /// Dice that cycle through `values` in order, wrapping at the end.
    ///
    /// Panics if `values` is empty.
    pub fn sequence(values: Vec<u8>) -> Self {
        assert!(!values.is_empty(), "dice sequence must not be empty");
        debug_assert!(values.iter().all(|v| (DICE_MIN..=DICE_MAX).contains(v)));
        Self {
            values,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl DiceSource for FixedDice {
    fn roll(&self) -> u8 {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.values[i % self.values.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_dice_in_range() {
        let dice = RandomDice::new();

        for _ in 0..100 {
            let value = dice.roll();
            assert!((DICE_MIN..=DICE_MAX).contains(&value));
        }
    }

    #[test]
    fn test_fixed_dice_always() {
        let dice = FixedDice::always(4);

        assert_eq!(dice.roll(), 4);
        assert_eq!(dice.roll(), 4);
        assert_eq!(dice.roll(), 4);
    }

    #[test]
    fn test_fixed_dice_sequence_wraps() {
        let dice = FixedDice::sequence(vec![1, 2, 3]);

        assert_eq!(dice.roll(), 1);
        assert_eq!(dice.roll(), 2);
        assert_eq!(dice.roll(), 3);
        assert_eq!(dice.roll(), 1);
    }

    #[test]
    #[should_panic(expected = "dice sequence must not be empty")]
    fn test_fixed_dice_panics_on_empty_sequence() {
        FixedDice::sequence(Vec::new());
    }

    #[test]
    fn test_fixed_dice_shared() {
        use std::sync::Arc;

        let dice: Arc<dyn DiceSource> = Arc::new(FixedDice::always(6));
        let clone = dice.clone();

        let handle = std::thread::spawn(move || clone.roll());

        assert_eq!(dice.roll(), 6);
        assert_eq!(handle.join().unwrap(), 6);
    }
}
