//! Random number generator abstraction for determinism.
//!
//! The success roll and the payout draw must happen server-side, and tests
//! must be able to pin both. Production injects [`StdRandom`]; tests inject
//! a seeded or scripted implementation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Abstraction over random number generation.
pub trait DeterministicRng: Send + Sync {
    /// Generate a random `u32` in the range `[min, max]` inclusive.
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32;

    /// Generate a random `f64` in `[0.0, 1.0)`.
    fn next_f64(&mut self) -> f64;
}

/// Production RNG: a `StdRng` seeded once from OS entropy.
#[derive(Debug)]
pub struct StdRandom(StdRng);

impl StdRandom {
    /// Creates a generator seeded from the operating system.
    #[must_use]
    pub fn from_os_entropy() -> Self {
        Self(StdRng::from_os_rng())
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::from_os_entropy()
    }
}

impl DeterministicRng for StdRandom {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        self.0.random_range(min..=max)
    }

    fn next_f64(&mut self) -> f64 {
        self.0.random()
    }
}
