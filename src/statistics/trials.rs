//! Repeated-trial measurement of a single comparator configuration.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::histogram::Histogram;
use super::summary::{OnlineStats, Summary};
use crate::comparator;
use crate::config::{ComparatorConfig, ComparatorMode, ConfigError, LatencySource, TrialConfig};

/// Samples and derived views of one trial batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialReport {
    /// Comparator semantics measured.
    pub mode: ComparatorMode,
    /// One latency per trial, in milliseconds, in trial order.
    pub samples: Vec<f64>,
    /// Bucketed samples.
    pub histogram: Histogram,
    /// Min/max/mean of the samples.
    pub summary: Summary,
}

/// The same batch measured against both comparators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeComparison {
    /// Early-exit comparator results.
    pub vulnerable: TrialReport,
    /// Fixed-length comparator results.
    pub secure: TrialReport,
}

impl ModeComparison {
    /// `vulnerable.mean - secure.mean`.
    pub fn mean_gap_ms(&self) -> f64 {
        self.vulnerable.summary.mean - self.secure.summary.mean
    }
}

/// Run `trials.trial_count` comparisons of `candidate` against `secret`.
///
/// Trials run one at a time. Every `max(1, trial_count / 10)` trials the task
/// yields so other work on the runtime can make progress.
pub async fn run_trials(
    candidate: &[u8],
    secret: &[u8],
    comparator_config: &ComparatorConfig,
    trials: &TrialConfig,
) -> Result<TrialReport, ConfigError> {
    comparator_config.validate_for(secret.len())?;
    trials.validate()?;

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(trials.seed);
    let batch = (trials.trial_count / 10).max(1);
    let mut samples = Vec::with_capacity(trials.trial_count);
    let mut stats = OnlineStats::new();

    for i in 0..trials.trial_count {
        let started = Instant::now();
        let outcome = comparator::compare(candidate, secret, comparator_config, &mut rng).await;
        let sample = match trials.latency_source {
            LatencySource::Reported => outcome.elapsed_ms,
            LatencySource::Observed => started.elapsed().as_secs_f64() * 1_000.0,
        };
        stats.update(sample);
        samples.push(sample);

        if (i + 1) % batch == 0 {
            tracing::debug!(done = i + 1, total = trials.trial_count, "trial batch");
            tokio::task::yield_now().await;
        }
    }

    let histogram = Histogram::build(&samples, trials.bins, trials.max_ms, trials.unit);
    let summary = stats.finalize();
    tracing::info!(
        mode = ?comparator_config.mode,
        trials = summary.count,
        mean_ms = summary.mean,
        "trials finished"
    );

    Ok(TrialReport {
        mode: comparator_config.mode,
        samples,
        histogram,
        summary,
    })
}

/// Run the same batch under both comparator modes, vulnerable first.
pub async fn compare_modes(
    candidate: &[u8],
    secret: &[u8],
    comparator_config: &ComparatorConfig,
    trials: &TrialConfig,
) -> Result<ModeComparison, ConfigError> {
    let vulnerable_config = comparator_config.clone().mode(ComparatorMode::Vulnerable);
    let secure_config = comparator_config.clone().mode(ComparatorMode::Secure);
    // Both configs are checked before any trial is scheduled.
    secure_config.validate_for(secret.len())?;
    trials.validate()?;

    let vulnerable = run_trials(candidate, secret, &vulnerable_config, trials).await?;
    let secure = run_trials(candidate, secret, &secure_config, trials).await?;
    Ok(ModeComparison { vulnerable, secure })
}
