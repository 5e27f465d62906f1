//! Deterministic utilities for reproducible training
//!
//! A seeded LCG drives every random choice (splits, bootstraps, feature
//! sampling) so identical settings always produce identical models.

use std::cmp::Ordering;

/// 64-bit linear congruential generator (Knuth MMIX constants)
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        let mut rng = Self { state: seed };
        // discard the first output so nearby seeds diverge immediately
        rng.next_u64();
        rng
    }

    /// Independent generator for a numbered sub-stream (e.g. one per tree)
    pub fn derive(seed: u64, stream: u64) -> Self {
        Self::new(seed ^ stream.wrapping_add(1).wrapping_mul(0x9E3779B97F4A7C15))
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
        // low bits of an LCG are weak; mix the high half down
        let x = self.state;
        x ^ (x >> 33)
    }

    /// Uniform value in `[0, max)`; returns 0 when `max` is 0
    pub fn next_below(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        ((self.next_u64() >> 11) % max as u64) as usize
    }

    /// Uniform value in `[0.0, 1.0)`
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Fisher-Yates shuffle
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_below(i + 1);
            items.swap(i, j);
        }
    }

    /// `count` distinct indices from `0..n`, in draw order
    pub fn sample_indices(&mut self, n: usize, count: usize) -> Vec<usize> {
        let mut pool: Vec<usize> = (0..n).collect();
        let count = count.min(n);
        for i in 0..count {
            let j = i + self.next_below(n - i);
            pool.swap(i, j);
        }
        pool.truncate(count);
        pool
    }
}

/// Deterministic tie-breaker for split selection
///
/// Among splits with equal impurity decrease, the lower feature index wins,
/// then the lower threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub threshold: f64,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, threshold: f64) -> Self {
        Self {
            feature_idx,
            threshold,
        }
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        self.feature_idx
            .cmp(&other.feature_idx)
            .then_with(|| self.threshold.total_cmp(&other.threshold))
    }
}
