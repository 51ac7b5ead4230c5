//! Fixed-range, equal-width histograms of latency samples.

use serde::{Deserialize, Serialize};

use crate::config::TimeUnit;

/// One bucket, `[range_start, range_end)`; the last bucket is closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    /// Lower edge, in the histogram's unit.
    pub range_start: f64,
    /// Upper edge, in the histogram's unit.
    pub range_end: f64,
    /// Samples that fell in this bucket.
    pub count: usize,
}

/// Equal-width buckets over `[0, max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Buckets in ascending order.
    pub buckets: Vec<HistogramBucket>,
    /// Unit of the bucket edges.
    pub unit: TimeUnit,
    /// Width of every bucket, in `unit`.
    pub bin_width: f64,
}

impl Histogram {
    /// Bucket `samples_ms` into `bins` buckets over `[0, max_ms]`.
    ///
    /// Samples above the range land in the last bucket, samples below 0 in
    /// the first, so every sample is counted exactly once. Callers validate
    /// `bins > 0` and `max_ms > 0` through `TrialConfig`.
    pub fn build(samples_ms: &[f64], bins: usize, max_ms: f64, unit: TimeUnit) -> Self {
        let bins = bins.max(1);
        let max = max_ms * unit.per_ms();
        let bin_width = max / bins as f64;

        let mut buckets: Vec<HistogramBucket> = (0..bins)
            .map(|i| HistogramBucket {
                range_start: max * i as f64 / bins as f64,
                range_end: max * (i + 1) as f64 / bins as f64,
                count: 0,
            })
            .collect();

        for &sample in samples_ms {
            let v = (sample * unit.per_ms()).clamp(0.0, max);
            let idx = if bin_width > 0.0 {
                ((v / bin_width).floor() as usize).min(bins - 1)
            } else {
                0
            };
            buckets[idx].count += 1;
        }

        Self {
            buckets,
            unit,
            bin_width,
        }
    }

    /// Sum of all bucket counts.
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }

    /// Largest bucket count, at least 1 so it can be used as a scale.
    pub fn max_count(&self) -> usize {
        self.buckets.iter().map(|b| b.count).max().unwrap_or(0).max(1)
    }
}
