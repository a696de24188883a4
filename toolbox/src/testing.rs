//! Deterministic sample generators for tests.

#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded RNG with a Box-Muller normal generator.
pub struct TestRng {
    rng: ChaCha8Rng,
    spare: Option<f64>,
}

impl TestRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            spare: None,
        }
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Uniform in `[lo, hi)`.
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Standard normal via Box-Muller.
    pub fn next_gaussian(&mut self) -> f64 {
        if let Some(v) = self.spare.take() {
            return v;
        }
        // 1 - u keeps the log argument in (0, 1]
        let u1 = 1.0 - self.next_f64();
        let u2 = self.next_f64();
        let radius = (-2.0 * u1.ln()).sqrt();
        let angle = 2.0 * std::f64::consts::PI * u2;
        self.spare = Some(radius * angle.sin());
        radius * angle.cos()
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }
}

/// `n` draws from N(mean, std²).
pub fn normal_samples(n: usize, mean: f64, std: f64, seed: u64) -> Vec<f64> {
    let mut rng = TestRng::new(seed);
    (0..n).map(|_| mean + std * rng.next_gaussian()).collect()
}

/// `n` points from an uncorrelated bivariate normal.
pub fn bivariate_normal(
    n: usize,
    mean: (f64, f64),
    std: (f64, f64),
    seed: u64,
) -> (Vec<f64>, Vec<f64>) {
    let mut rng = TestRng::new(seed);
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    for _ in 0..n {
        x.push(mean.0 + std.0 * rng.next_gaussian());
        y.push(mean.1 + std.1 * rng.next_gaussian());
    }
    (x, y)
}

/// `n` points uniformly scattered over `[x0, x1) × [y0, y1)`.
pub fn uniform_points(n: usize, x: (f64, f64), y: (f64, f64), seed: u64) -> (Vec<f64>, Vec<f64>) {
    let mut rng = TestRng::new(seed);
    (0..n)
        .map(|_| (rng.uniform(x.0, x.1), rng.uniform(y.0, y.1)))
        .unzip()
}

pub fn init_tracing() {
    common::log_setup::init_test_tracing();
}
