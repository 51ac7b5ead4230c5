//! Configuration for comparators, attack runs and trial batches.
//!
//! Every config has a `Default`, builder-style setters and a `validate()`
//! that callers (and the engine itself) run before anything is scheduled.
//! Misconfiguration is reported, never silently replaced by a default.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attack::DEFAULT_LOG_CAPACITY;
use crate::types::Alphabet;

/// Upper bound for any single configured delay: one hour.
pub const MAX_DELAY_MS: f64 = 3_600_000.0;

/// Reasons a configuration is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The alphabet has no symbols.
    #[error("alphabet must contain at least one symbol")]
    EmptyAlphabet,

    /// A symbol appears more than once in the alphabet.
    #[error("alphabet contains duplicate symbol {0:?}")]
    DuplicateSymbol(char),

    /// Per-unit delay is zero, negative or not finite.
    #[error("per_unit_delay_ms must be > 0, got {0}")]
    NonPositiveDelay(f64),

    /// Noise range is negative or not finite.
    #[error("noise_range_ms must be >= 0, got {0}")]
    InvalidNoise(f64),

    /// Base latency is negative or not finite.
    #[error("base_latency_ms must be >= 0, got {0}")]
    InvalidBaseLatency(f64),

    /// A per-unit delay, noise range or base latency above [`MAX_DELAY_MS`].
    #[error("{field} must be at most {max} ms, got {value}", max = MAX_DELAY_MS)]
    DelayTooLarge {
        /// Name of the offending field.
        field: &'static str,
        /// The configured value.
        value: f64,
    },

    /// Secure mode must examine at least one position.
    #[error("fixed_length must be > 0")]
    ZeroFixedLength,

    /// Secure mode would skip trailing secret symbols.
    #[error("fixed_length {fixed_length} is shorter than the secret ({secret_len} symbols)")]
    FixedLengthTooShort {
        /// Configured loop length.
        fixed_length: usize,
        /// Length of the secret.
        secret_len: usize,
    },

    /// The secret has no symbols.
    #[error("secret must not be empty")]
    EmptySecret,

    /// The secret holds a symbol the alphabet cannot produce.
    #[error("secret symbol {symbol:?} at position {position} is not in the alphabet")]
    SymbolOutsideAlphabet {
        /// Index of the offending symbol.
        position: usize,
        /// The symbol itself.
        symbol: char,
    },

    /// The filler symbol is not part of the alphabet.
    #[error("filler symbol {0:?} is not in the alphabet")]
    FillerOutsideAlphabet(char),

    /// Leak threshold is negative or not finite.
    #[error("leak_threshold_ms must be >= 0, got {0}")]
    InvalidLeakThreshold(f64),

    /// The rolling log must hold at least one line.
    #[error("log_capacity must be > 0")]
    ZeroLogCapacity,

    /// A trial batch needs at least one trial.
    #[error("trial_count must be > 0")]
    NonPositiveTrialCount,

    /// A histogram needs at least one bucket.
    #[error("bins must be > 0")]
    ZeroBins,

    /// Histogram range is zero, negative or not finite.
    #[error("max_ms must be > 0, got {0}")]
    NonPositiveRange(f64),
}

/// Which comparison semantics the verifier uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparatorMode {
    /// Early-exit comparison; cost grows with the matched prefix.
    Vulnerable,
    /// Fixed-length comparison; cost is independent of content.
    Secure,
}

/// Where the engine and trial runner take a latency from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LatencySource {
    /// The latency the verifier reports.
    #[default]
    Reported,
    /// Wall-clock time measured around the call.
    Observed,
}

/// Display unit for histogram ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeUnit {
    /// Milliseconds.
    #[default]
    Millis,
    /// Microseconds.
    Micros,
}

impl TimeUnit {
    /// Factor converting milliseconds into this unit.
    pub fn per_ms(&self) -> f64 {
        match self {
            TimeUnit::Millis => 1.0,
            TimeUnit::Micros => 1_000.0,
        }
    }

    /// Short suffix for display.
    pub fn suffix(&self) -> &'static str {
        match self {
            TimeUnit::Millis => "ms",
            TimeUnit::Micros => "µs",
        }
    }
}

/// Timing behaviour of a simulated comparator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparatorConfig {
    /// Comparison semantics.
    pub mode: ComparatorMode,

    /// Cost of one compared unit in milliseconds. Default: 40.
    pub per_unit_delay_ms: f64,

    /// Uniform jitter applied to every unit, `±noise_range_ms`. Default: 0.
    pub noise_range_ms: f64,

    /// Loop length of the secure comparator. Ignored in vulnerable mode.
    /// Default: 8.
    pub fixed_length: usize,

    /// Fixed overhead added to every call. Default: 15.
    pub base_latency_ms: f64,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            mode: ComparatorMode::Vulnerable,
            per_unit_delay_ms: 40.0,
            noise_range_ms: 0.0,
            fixed_length: 8,
            base_latency_ms: 15.0,
        }
    }
}

impl ComparatorConfig {
    /// Early-exit comparator with default timings.
    pub fn vulnerable() -> Self {
        Self::default()
    }

    /// Fixed-length comparator with default timings.
    pub fn secure(fixed_length: usize) -> Self {
        Self {
            mode: ComparatorMode::Secure,
            fixed_length,
            ..Self::default()
        }
    }

    /// Set the comparison mode.
    pub fn mode(mut self, mode: ComparatorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the per-unit delay.
    pub fn per_unit_delay_ms(mut self, ms: f64) -> Self {
        self.per_unit_delay_ms = ms;
        self
    }

    /// Set the noise range.
    pub fn noise_range_ms(mut self, ms: f64) -> Self {
        self.noise_range_ms = ms;
        self
    }

    /// Set the secure loop length.
    pub fn fixed_length(mut self, n: usize) -> Self {
        self.fixed_length = n;
        self
    }

    /// Set the base latency.
    pub fn base_latency_ms(mut self, ms: f64) -> Self {
        self.base_latency_ms = ms;
        self
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.per_unit_delay_ms.is_finite() && self.per_unit_delay_ms > 0.0) {
            return Err(ConfigError::NonPositiveDelay(self.per_unit_delay_ms));
        }
        if !(self.noise_range_ms.is_finite() && self.noise_range_ms >= 0.0) {
            return Err(ConfigError::InvalidNoise(self.noise_range_ms));
        }
        if !(self.base_latency_ms.is_finite() && self.base_latency_ms >= 0.0) {
            return Err(ConfigError::InvalidBaseLatency(self.base_latency_ms));
        }
        for (field, value) in [
            ("per_unit_delay_ms", self.per_unit_delay_ms),
            ("noise_range_ms", self.noise_range_ms),
            ("base_latency_ms", self.base_latency_ms),
        ] {
            if value > MAX_DELAY_MS {
                return Err(ConfigError::DelayTooLarge { field, value });
            }
        }
        if self.fixed_length == 0 {
            return Err(ConfigError::ZeroFixedLength);
        }
        Ok(())
    }

    /// Check field ranges and that the secure loop covers a secret of `secret_len`.
    pub fn validate_for(&self, secret_len: usize) -> Result<(), ConfigError> {
        self.validate()?;
        if self.mode == ComparatorMode::Secure && self.fixed_length < secret_len {
            return Err(ConfigError::FixedLengthTooShort {
                fixed_length: self.fixed_length,
                secret_len,
            });
        }
        Ok(())
    }
}

/// Settings for a brute-force reconstruction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackConfig {
    /// Symbols tried at each position, in order. Default: hex digits.
    pub alphabet: Alphabet,

    /// Symbol placed at positions not yet attacked. Default: `'0'`.
    pub filler: u8,

    /// Minimum gap between the slowest candidate and the median of the other
    /// candidates for the round to count as leaking. Default: 10 ms.
    pub leak_threshold_ms: f64,

    /// Whether to use reported or wall-clock latency. Default: reported.
    pub latency_source: LatencySource,

    /// Pause after each candidate, for visual pacing. Default: none.
    pub candidate_pause: Duration,

    /// Pause after each round, for visual pacing. Default: none.
    pub round_pause: Duration,

    /// Maximum number of retained log lines. Default: 50.
    pub log_capacity: usize,

    /// Seed for the simulated server's noise. `AttackController` hands
    /// `seed + run_index` to its oracle factory. Default: 0.
    pub seed: u64,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            alphabet: Alphabet::hex(),
            filler: b'0',
            leak_threshold_ms: 10.0,
            latency_source: LatencySource::Reported,
            candidate_pause: Duration::ZERO,
            round_pause: Duration::ZERO,
            log_capacity: DEFAULT_LOG_CAPACITY,
            seed: 0,
        }
    }
}

impl AttackConfig {
    /// Default settings with the demo pacing: 15 ms per candidate, 100 ms per round.
    pub fn paced() -> Self {
        Self {
            candidate_pause: Duration::from_millis(15),
            round_pause: Duration::from_millis(100),
            ..Self::default()
        }
    }

    /// Set the alphabet. The filler becomes its first symbol.
    pub fn alphabet(mut self, alphabet: Alphabet) -> Self {
        if let Some(&first) = alphabet.symbols().first() {
            self.filler = first;
        }
        self.alphabet = alphabet;
        self
    }

    /// Set the filler symbol.
    pub fn filler(mut self, filler: u8) -> Self {
        self.filler = filler;
        self
    }

    /// Set the leak threshold.
    pub fn leak_threshold_ms(mut self, ms: f64) -> Self {
        self.leak_threshold_ms = ms;
        self
    }

    /// Set the latency source.
    pub fn latency_source(mut self, source: LatencySource) -> Self {
        self.latency_source = source;
        self
    }

    /// Set the per-candidate pause.
    pub fn candidate_pause(mut self, pause: Duration) -> Self {
        self.candidate_pause = pause;
        self
    }

    /// Set the per-round pause.
    pub fn round_pause(mut self, pause: Duration) -> Self {
        self.round_pause = pause;
        self
    }

    /// Set the rolling log capacity.
    pub fn log_capacity(mut self, n: usize) -> Self {
        self.log_capacity = n;
        self
    }

    /// Set the oracle seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alphabet.is_empty() {
            return Err(ConfigError::EmptyAlphabet);
        }
        if !self.alphabet.contains(self.filler) {
            return Err(ConfigError::FillerOutsideAlphabet(self.filler as char));
        }
        if !(self.leak_threshold_ms.is_finite() && self.leak_threshold_ms >= 0.0) {
            return Err(ConfigError::InvalidLeakThreshold(self.leak_threshold_ms));
        }
        if self.log_capacity == 0 {
            return Err(ConfigError::ZeroLogCapacity);
        }
        Ok(())
    }
}

/// Settings for a repeated-trial measurement batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialConfig {
    /// Number of comparator invocations. Default: 100.
    pub trial_count: usize,

    /// Number of histogram buckets. Default: 10.
    pub bins: usize,

    /// Upper edge of the histogram range in milliseconds. Default: 15.
    pub max_ms: f64,

    /// Unit the histogram ranges are expressed in. Default: milliseconds.
    pub unit: TimeUnit,

    /// Whether samples are reported or wall-clock latencies. Default: reported.
    pub latency_source: LatencySource,

    /// Seed for comparator noise. Default: 0.
    pub seed: u64,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            trial_count: 100,
            bins: 10,
            max_ms: 15.0,
            unit: TimeUnit::Millis,
            latency_source: LatencySource::Reported,
            seed: 0,
        }
    }
}

impl TrialConfig {
    /// Set the trial count.
    pub fn trial_count(mut self, n: usize) -> Self {
        self.trial_count = n;
        self
    }

    /// Set the bucket count.
    pub fn bins(mut self, n: usize) -> Self {
        self.bins = n;
        self
    }

    /// Set the histogram range.
    pub fn max_ms(mut self, ms: f64) -> Self {
        self.max_ms = ms;
        self
    }

    /// Set the display unit.
    pub fn unit(mut self, unit: TimeUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Set the latency source.
    pub fn latency_source(mut self, source: LatencySource) -> Self {
        self.latency_source = source;
        self
    }

    /// Set the noise seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trial_count == 0 {
            return Err(ConfigError::NonPositiveTrialCount);
        }
        if self.bins == 0 {
            return Err(ConfigError::ZeroBins);
        }
        if !(self.max_ms.is_finite() && self.max_ms > 0.0) {
            return Err(ConfigError::NonPositiveRange(self.max_ms));
        }
        Ok(())
    }
}
