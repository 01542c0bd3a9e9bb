//! Random source seam
//!
//! The round engine only ever asks for uniform values in `[0, 1)`. Every
//! generator and bias-pass draw goes through one sequential stream, so a
//! fixed seed reproduces a session exactly.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniform `[0, 1)` source
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;

    /// Uniform index in `0..len` (0 when `len` is 0)
    fn next_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        ((self.next_unit() * len as f64) as usize).min(len - 1)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// Seeded session RNG (ChaCha8)
#[derive(Debug, Clone)]
pub struct SessionRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SessionRng {
    /// Seed 0 picks a fresh seed from the thread RNG; the chosen seed is
    /// kept so the session can be replayed.
    pub fn new(seed: u64) -> Self {
        let seed = if seed == 0 {
            rand::rng().random_range(1..u64::MAX)
        } else {
            seed
        };
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Effective seed
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SessionRng {
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Adapter for a plain zero-argument closure
pub struct FnSource<F>(pub F);

impl<F: FnMut() -> f64> RandomSource for FnSource<F> {
    fn next_unit(&mut self) -> f64 {
        (self.0)().clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// Replays a fixed sequence of values, cycling when exhausted
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedRng {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    /// Number of values drawn so far
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRng {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v.clamp(0.0, 1.0 - f64::EPSILON)
    }
}
