//! Seedable Gaussian noise source.
//!
//! A 64-bit LCG feeding a Box-Muller transform. The simulator owns one
//! instance and advances it every tick, so noise differs from tick to tick
//! while a run started from the same seed is exactly reproducible.

use std::f64::consts::PI;

/// Default seed used by [`NoiseSource::default`].
pub const DEFAULT_SEED: u64 = 12345;

/// Pseudo-random Gaussian source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseSource {
    state: u64,
}

impl Default for NoiseSource {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl NoiseSource {
    /// Create a source from a seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Uniform sample in [0, 1).
    pub fn next_uniform(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        (self.state >> 33) as f64 / (1u64 << 31) as f64
    }

    /// Standard normal sample.
    pub fn next_gaussian(&mut self) -> f64 {
        let u1 = self.next_uniform().max(1e-10);
        let u2 = self.next_uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// `n` samples of zero-mean Gaussian noise with standard deviation `sigma`.
    pub fn gaussian(&mut self, n: usize, sigma: f64) -> Vec<f64> {
        (0..n).map(|_| sigma * self.next_gaussian()).collect()
    }
}
