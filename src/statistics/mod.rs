//! Measurement aggregation for repeated comparator trials.
//!
//! This module provides:
//! - Streaming summary statistics (min/max/mean/std-dev) via Welford's algorithm
//! - Equal-width histograms over a fixed range with edge clamping
//! - Trial runners that collect samples for one or both comparator modes

mod histogram;
mod summary;
mod trials;

pub use histogram::{Histogram, HistogramBucket};
pub use summary::{median, OnlineStats, Summary};
pub use trials::{compare_modes, run_trials, ModeComparison, TrialReport};
