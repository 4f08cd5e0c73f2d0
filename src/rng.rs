use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::game::GameColor;

/// Inclusive lower bound of the randomized rotation delay
pub const ROTATION_DELAY_MIN_MS: u64 = 1000;
/// Exclusive width of the randomized rotation delay range
pub const ROTATION_DELAY_SPREAD_MS: u64 = 2000;

/// Source of the game's randomness. Injectable so rotation timing and
/// color selection are deterministic under test.
pub trait RotationRng {
    /// Uniform pick over the color set.
    fn next_color(&mut self) -> GameColor;
    /// Uniform delay in `[ROTATION_DELAY_MIN_MS, ROTATION_DELAY_MIN_MS +
    /// ROTATION_DELAY_SPREAD_MS)` milliseconds.
    fn next_rotation_delay(&mut self) -> u64;
}

/// Production randomness over `rand`'s standard generator
#[derive(Debug, Clone)]
pub struct RandRotation {
    rng: StdRng,
}

impl RandRotation {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded generator for reproducible runs (`--seed`).
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RotationRng for RandRotation {
    fn next_color(&mut self) -> GameColor {
        GameColor::ALL[self.rng.gen_range(0..GameColor::ALL.len())]
    }

    fn next_rotation_delay(&mut self) -> u64 {
        self.rng
            .gen_range(ROTATION_DELAY_MIN_MS..ROTATION_DELAY_MIN_MS + ROTATION_DELAY_SPREAD_MS)
    }
}

/// Scripted source for tests. Both sequences cycle, so a single-element
/// script behaves like a constant.
#[derive(Debug, Clone)]
pub struct ScriptedRotation {
    colors: VecDeque<GameColor>,
    delays: VecDeque<u64>,
}

impl ScriptedRotation {
    pub fn new(colors: &[GameColor], delays: &[u64]) -> Self {
        Self {
            colors: colors.iter().copied().collect(),
            delays: delays.iter().copied().collect(),
        }
    }

    /// Script that always yields the same color and delay.
    pub fn always(color: GameColor, delay_ms: u64) -> Self {
        Self::new(&[color], &[delay_ms])
    }
}

impl RotationRng for ScriptedRotation {
    fn next_color(&mut self) -> GameColor {
        let color = self.colors.pop_front().unwrap_or(GameColor::Red);
        self.colors.push_back(color);
        color
    }

    fn next_rotation_delay(&mut self) -> u64 {
        let delay = self.delays.pop_front().unwrap_or(ROTATION_DELAY_MIN_MS);
        self.delays.push_back(delay);
        delay
    }
}
