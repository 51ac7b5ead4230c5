//! Early-exit and constant-time comparator models.
//!
//! Each comparison is evaluated in two steps. [`evaluate`] is a pure cost
//! model that decides the verdict and the cost of every compared unit. The
//! async wrappers then realize those costs as real timer waits, one per unit,
//! so a caller holding a clock sees the designed difference.

use std::time::Duration;

use rand::Rng;
use tokio::time::{sleep_until, Instant};

use crate::config::{ComparatorConfig, ComparatorMode};
use crate::types::ComparisonOutcome;

/// Stand-in for a position past the end of an input. No alphabet produces it
/// in practice, and the secure comparator also requires equal lengths.
pub const PLACEHOLDER: u8 = 0x00;

/// Verdict and per-unit cost breakdown of a single comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonTrace {
    /// Whether the inputs are equal.
    pub matched: bool,
    /// Matched prefix length, known only to the early-exit comparator.
    pub match_prefix_length: Option<usize>,
    /// Fixed overhead paid before the loop.
    pub base_ms: f64,
    /// Cost of each unit paid, in loop order.
    pub unit_costs_ms: Vec<f64>,
}

impl ComparisonTrace {
    /// Total simulated time.
    pub fn elapsed_ms(&self) -> f64 {
        self.base_ms + self.unit_costs_ms.iter().sum::<f64>()
    }

    /// Collapse into the externally visible outcome.
    pub fn outcome(&self) -> ComparisonOutcome {
        ComparisonOutcome {
            matched: self.matched,
            elapsed_ms: self.elapsed_ms(),
            match_prefix_length: self.match_prefix_length,
        }
    }
}

/// Evaluate the cost model for `config.mode` without waiting.
pub fn evaluate<R: Rng + ?Sized>(
    candidate: &[u8],
    secret: &[u8],
    config: &ComparatorConfig,
    rng: &mut R,
) -> ComparisonTrace {
    match config.mode {
        ComparatorMode::Vulnerable => trace_vulnerable(candidate, secret, config, rng),
        ComparatorMode::Secure => trace_secure(candidate, secret, config, rng),
    }
}

/// Compare with the semantics selected by `config.mode`, waiting out the cost.
pub async fn compare<R: Rng + ?Sized>(
    candidate: &[u8],
    secret: &[u8],
    config: &ComparatorConfig,
    rng: &mut R,
) -> ComparisonOutcome {
    let trace = evaluate(candidate, secret, config, rng);
    realize(&trace).await;
    trace.outcome()
}

/// Early-exit comparison.
///
/// Walks `0..max(len(candidate), len(secret))` and stops at the first position
/// that differs or where either input is exhausted. One unit of
/// `per_unit_delay_ms ± noise` is paid for every position that matched, so
/// elapsed time grows with the matched prefix. `config.mode` is ignored.
pub async fn vulnerable_compare<R: Rng + ?Sized>(
    candidate: &[u8],
    secret: &[u8],
    config: &ComparatorConfig,
    rng: &mut R,
) -> ComparisonOutcome {
    let trace = trace_vulnerable(candidate, secret, config, rng);
    realize(&trace).await;
    trace.outcome()
}

/// Fixed-length comparison.
///
/// Always runs exactly `config.fixed_length` iterations and pays one unit at
/// each of them. Differences are folded into an XOR accumulator and the loop
/// never branches on it; `matched` is `acc == 0` plus equal lengths.
/// `config.mode` is ignored.
///
/// The simulated cost cannot short-circuit, but a real implementation written
/// as `if a != b { result = false }` gives the compiler a data-dependent
/// branch to exploit. Keep the accumulator form when porting this to code
/// that runs on real hardware.
pub async fn secure_compare<R: Rng + ?Sized>(
    candidate: &[u8],
    secret: &[u8],
    config: &ComparatorConfig,
    rng: &mut R,
) -> ComparisonOutcome {
    let trace = trace_secure(candidate, secret, config, rng);
    realize(&trace).await;
    trace.outcome()
}

/// Wait out a trace's cost: the base overhead, then one deadline per unit.
///
/// Deadlines are cumulative from a single start instant so timer rounding
/// does not accumulate across units.
pub async fn realize(trace: &ComparisonTrace) {
    let start = Instant::now();
    let mut spent_ms = trace.base_ms;
    if spent_ms > 0.0 {
        sleep_until(deadline(start, spent_ms)).await;
    }
    for cost in &trace.unit_costs_ms {
        spent_ms += cost;
        sleep_until(deadline(start, spent_ms)).await;
    }
}

/// Roughly 30 years; stands in for "never" when a deadline overflows.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline(start: Instant, ms: f64) -> Instant {
    start
        .checked_add(ms_to_duration(ms))
        .unwrap_or_else(|| start + FAR_FUTURE)
}

/// Negative and NaN costs wait nothing; costs too large for a `Duration`
/// saturate.
fn ms_to_duration(ms: f64) -> Duration {
    Duration::try_from_secs_f64(ms.max(0.0) / 1_000.0).unwrap_or(Duration::MAX)
}

fn unit_cost<R: Rng + ?Sized>(config: &ComparatorConfig, rng: &mut R) -> f64 {
    let noise = config.noise_range_ms;
    if noise > 0.0 {
        (config.per_unit_delay_ms + rng.gen_range(-noise..=noise)).max(0.0)
    } else {
        config.per_unit_delay_ms
    }
}

fn trace_vulnerable<R: Rng + ?Sized>(
    candidate: &[u8],
    secret: &[u8],
    config: &ComparatorConfig,
    rng: &mut R,
) -> ComparisonTrace {
    let len = candidate.len().max(secret.len());
    let mut unit_costs_ms = Vec::with_capacity(len);

    for i in 0..len {
        match (candidate.get(i), secret.get(i)) {
            (Some(a), Some(b)) if a == b => unit_costs_ms.push(unit_cost(config, rng)),
            _ => {
                return ComparisonTrace {
                    matched: false,
                    match_prefix_length: Some(i),
                    base_ms: config.base_latency_ms,
                    unit_costs_ms,
                }
            }
        }
    }

    ComparisonTrace {
        matched: true,
        match_prefix_length: Some(len),
        base_ms: config.base_latency_ms,
        unit_costs_ms,
    }
}

fn trace_secure<R: Rng + ?Sized>(
    candidate: &[u8],
    secret: &[u8],
    config: &ComparatorConfig,
    rng: &mut R,
) -> ComparisonTrace {
    let mut acc = 0u8;
    let mut unit_costs_ms = Vec::with_capacity(config.fixed_length);

    for i in 0..config.fixed_length {
        let a = candidate.get(i).copied().unwrap_or(PLACEHOLDER);
        let b = secret.get(i).copied().unwrap_or(PLACEHOLDER);
        acc |= a ^ b;
        unit_costs_ms.push(unit_cost(config, rng));
    }

    ComparisonTrace {
        matched: acc == 0 && candidate.len() == secret.len(),
        match_prefix_length: None,
        base_ms: config.base_latency_ms,
        unit_costs_ms,
    }
}
