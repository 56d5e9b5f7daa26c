//! The simulation's seeded random stream.
//!
//! # Determinism strategy
//!
//! One `SimRng` per simulation, reseeded from `SimConfig::seed` at the start
//! of every run.  All randomness (waiting times, reaction choice, pool index
//! draws, expression `rand` reads) is pulled from it in a fixed order, so a
//! seed fully determines the sequence of fired reactions.
//!
//! The backing generator is ChaCha8 rather than `SmallRng`: its output stream
//! is specified and stable across platforms and `rand` releases, which
//! `SmallRng` explicitly does not promise.

use rand::distributions::Open01;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Simulation-level RNG.  Owned by exactly one simulation; `!Sync` use only.
pub struct SimRng(ChaCha8Rng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Restart the stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.0 = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Uniform draw on `[0, 1)`.
    #[inline]
    pub fn uniform01(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }

    /// Uniform draw on the open interval `(0, 1)`, safe to pass to `ln`.
    #[inline]
    pub fn uniform_open01(&mut self) -> f64 {
        self.0.sample(Open01)
    }

    /// Uniform index in `[0, n)`.
    ///
    /// # Panics
    /// Panics if `n == 0`.
    #[inline]
    pub fn index_below(&mut self, n: usize) -> usize {
        self.0.gen_range(0..n)
    }
}
