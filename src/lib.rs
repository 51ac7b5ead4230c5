//! # timing-attack-sim
//!
//! Simulate timing side-channel attacks against string/byte comparators.
//!
//! This crate models two comparators and attacks them through their timing:
//! - An early-exit comparator whose latency grows with the matched prefix
//! - A fixed-length comparator whose latency does not depend on content
//! - A brute-force engine that recovers a secret byte by byte from latencies
//! - Trial runners that aggregate latencies into histograms and summaries
//!
//! All latencies are synthetic. They are deliberate delays realized with
//! Tokio timers, not measurements of real hardware.
//!
//! ## Quick Start
//!
//! ```no_run
//! use timing_attack_sim::{
//!     AttackConfig, ComparatorConfig, ReconstructionEngine, SimulatedServer,
//! };
//!
//! # async fn demo() -> Result<(), timing_attack_sim::ConfigError> {
//! let server = SimulatedServer::new("b7f2a9c4", ComparatorConfig::vulnerable(), 0)?;
//! let mut engine = ReconstructionEngine::new(AttackConfig::default(), server)?;
//! let report = engine.run().await;
//!
//! println!("{}", timing_attack_sim::output::format_attack_report(&report));
//! assert_eq!(report.recovered, "b7f2a9c4");
//! # Ok(())
//! # }
//! ```
//!
//! ## Tests and Paused Time
//!
//! Runs with realistic delays take minutes of wall-clock time. Under
//! `#[tokio::test(start_paused = true)]` Tokio advances its clock as soon as
//! every task is waiting on a timer, so the same runs finish instantly with
//! identical latencies.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod oracle;
mod types;

// Functional modules
pub mod attack;
pub mod comparator;
pub mod output;
pub mod statistics;

// Re-exports for public API
pub use attack::{
    AbortSignal, AttackController, AttackReport, EngineSnapshot, ReconstructionEngine,
    ReconstructionState, RollingLog,
};
pub use comparator::{secure_compare, vulnerable_compare};
pub use config::{
    AttackConfig, ComparatorConfig, ComparatorMode, ConfigError, LatencySource, TimeUnit,
    TrialConfig, MAX_DELAY_MS,
};
pub use oracle::{SimulatedServer, VerificationOracle};
pub use statistics::{
    compare_modes, run_trials, Histogram, HistogramBucket, ModeComparison, Summary, TrialReport,
};
pub use types::{
    Alphabet, AttackRound, AttackStatus, CandidateMeasurement, ComparisonOutcome, RoundVerdict,
    SecretValue, Verification,
};
