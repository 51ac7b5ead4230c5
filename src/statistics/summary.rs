//! Streaming summary statistics over latency samples.
//!
//! Mean and variance are accumulated with Welford's algorithm so a trial batch
//! never needs a second pass.

use serde::{Deserialize, Serialize};

/// Online accumulator for count, min, max, mean and variance.
#[derive(Debug, Clone)]
pub struct OnlineStats {
    count: usize,
    min: f64,
    max: f64,
    mean: f64,
    /// Sum of squared deviations from the running mean.
    m2: f64,
}

impl Default for OnlineStats {
    fn default() -> Self {
        Self::new()
    }
}

impl OnlineStats {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self {
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            mean: 0.0,
            m2: 0.0,
        }
    }

    /// Add one sample.
    pub fn update(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    /// Number of samples seen.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Freeze into a [`Summary`]. All fields are 0 for an empty accumulator.
    pub fn finalize(&self) -> Summary {
        if self.count == 0 {
            return Summary::default();
        }
        let variance = if self.count > 1 {
            self.m2 / (self.count - 1) as f64
        } else {
            0.0
        };
        Summary {
            count: self.count,
            min: self.min,
            max: self.max,
            mean: self.mean,
            std_dev: variance.sqrt(),
        }
    }
}

impl Extend<f64> for OnlineStats {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for x in iter {
            self.update(x);
        }
    }
}

/// Summary of a batch of latencies, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of samples.
    pub count: usize,
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation.
    pub std_dev: f64,
}

impl Summary {
    /// Summarize a slice in one pass.
    pub fn of(samples: &[f64]) -> Self {
        let mut stats = OnlineStats::new();
        stats.extend(samples.iter().copied());
        stats.finalize()
    }
}

/// Median of `values`; 0 for an empty slice. Does not reorder the input.
pub fn median(values: &[f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let mut data = values.to_vec();
    let mid = n / 2;
    let (lower, &mut upper, _) = data.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    if n % 2 == 1 {
        return upper;
    }
    let below = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (below + upper) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welford_matches_direct() {
        let data = [135.0, 95.0, 95.0, 175.0, 55.0];
        let s = Summary::of(&data);
        let mean = data.iter().sum::<f64>() / 5.0;
        let var = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 4.0;
        assert_eq!(s.count, 5);
        assert!((s.mean - mean).abs() < 1e-9);
        assert!((s.std_dev - var.sqrt()).abs() < 1e-9);
        assert_eq!(s.min, 55.0);
        assert_eq!(s.max, 175.0);
    }

    #[test]
    fn empty_summary_is_zero() {
        assert_eq!(Summary::of(&[]), Summary::default());
    }

    #[test]
    fn single_sample_has_no_spread() {
        let s = Summary::of(&[4.0]);
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.min, 4.0);
        assert_eq!(s.max, 4.0);
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }
}
