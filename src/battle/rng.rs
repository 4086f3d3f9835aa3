//! Random number sources for the battle core.
//!
//! Every chance roll in a battle goes through one `BattleRng`, so a seeded
//! generator replays a battle exactly and a scripted one pins outcomes in tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use tracing::trace;

pub trait BattleRng: fmt::Debug {
    /// Uniform integer in `[0, upper)`. `upper` of 0 yields 0.
    fn range(&mut self, upper: u32, reason: &str) -> u32;

    /// Uniform float in `[0, 1)`.
    fn float(&mut self, reason: &str) -> f64;

    /// True with `percent`% probability.
    fn chance(&mut self, percent: u8, reason: &str) -> bool {
        self.range(100, reason) < percent as u32
    }
}

#[derive(Debug)]
pub struct SeededRng {
    rng: StdRng,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl BattleRng for SeededRng {
    fn range(&mut self, upper: u32, reason: &str) -> u32 {
        if upper == 0 {
            return 0;
        }
        let value = self.rng.random_range(0..upper);
        trace!(value, upper, reason, "rng range");
        value
    }

    fn float(&mut self, reason: &str) -> f64 {
        let value: f64 = self.rng.random();
        trace!(value, reason, "rng float");
        value
    }
}

/// Replays a fixed list of rolls in `1..=100`.
///
/// `chance(p)` succeeds when the roll is `<= p`, `range(n)` scales the roll
/// onto `[0, n)` and `float` returns `(roll - 1) / 100`.
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    outcomes: Vec<u8>,
    index: usize,
}

impl ScriptedRng {
    pub fn new(outcomes: Vec<u8>) -> Self {
        Self { outcomes, index: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.outcomes.len() - self.index
    }

    fn next_roll(&mut self, reason: &str) -> u8 {
        if self.index >= self.outcomes.len() {
            panic!(
                "ScriptedRng exhausted! Tried to get a value for: '{}'. Need more random values.",
                reason
            );
        }
        let roll = self.outcomes[self.index].clamp(1, 100);
        trace!(roll, reason, "scripted roll");
        self.index += 1;
        roll
    }
}

impl BattleRng for ScriptedRng {
    fn range(&mut self, upper: u32, reason: &str) -> u32 {
        let roll = self.next_roll(reason) as u32;
        ((roll - 1) * upper) / 100
    }

    fn float(&mut self, reason: &str) -> f64 {
        (self.next_roll(reason) - 1) as f64 / 100.0
    }

    fn chance(&mut self, percent: u8, reason: &str) -> bool {
        self.next_roll(reason) <= percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_rng_replays() {
        let mut a = SeededRng::new(7);
        let mut b = SeededRng::new(7);
        for _ in 0..20 {
            assert_eq!(a.range(1000, "test"), b.range(1000, "test"));
        }
        let value = a.float("test");
        assert!((0.0..1.0).contains(&value));
    }

    #[test]
    fn test_scripted_rng_maps_rolls() {
        let mut rng = ScriptedRng::new(vec![1, 100, 30, 31, 51]);
        assert_eq!(rng.range(16, "low"), 0);
        assert_eq!(rng.range(16, "high"), 15);
        assert!(rng.chance(30, "hit"));
        assert!(!rng.chance(30, "miss"));
        assert_eq!(rng.float("half"), 0.5);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    #[should_panic(expected = "ScriptedRng exhausted")]
    fn test_scripted_rng_panics_when_empty() {
        let mut rng = ScriptedRng::new(vec![]);
        rng.float("nothing left");
    }
}
