//! Injectable random source.
//!
//! The optimizer draws every random decision (initial assignment, mutated
//! position, replacement resource, crowding tie-break) through
//! [`RandomSource`], so an experiment is reproducible from its seed alone.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Minimal random capability consumed by the engine.
pub trait RandomSource {
    /// Uniform integer in `[min, max]` (both inclusive).
    ///
    /// Callers guarantee `min <= max`.
    fn next_uniform_int(&mut self, min: u64, max: u64) -> u64;

    /// Seed the source was last initialized with.
    fn seed(&self) -> u64;

    /// Re-initializes the source.
    fn reseed(&mut self, seed: u64);

    /// Uniform index in `0..len`. Callers guarantee `len > 0`.
    fn next_index(&mut self, len: usize) -> usize {
        self.next_uniform_int(0, len as u64 - 1) as usize
    }
}

/// [`RandomSource`] backed by [`SmallRng`].
#[derive(Debug, Clone)]
pub struct SeededRng {
    seed: u64,
    rng: SmallRng,
}

impl SeededRng {
    /// Creates a source with an explicit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Creates a source seeded from the operating system.
    ///
    /// The drawn seed stays queryable through [`RandomSource::seed`].
    pub fn from_os() -> Self {
        Self::new(rand::random())
    }

    /// Uses `seed` when given, otherwise seeds from the operating system.
    pub fn from_optional(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_os, Self::new)
    }
}

impl RandomSource for SeededRng {
    fn next_uniform_int(&mut self, min: u64, max: u64) -> u64 {
        self.rng.random_range(min..=max)
    }

    fn seed(&self) -> u64 {
        self.seed
    }

    fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = SmallRng::seed_from_u64(seed);
    }
}
