//! Brute-force reconstruction of a secret through a timing oracle.
//!
//! This module provides:
//! - [`ReconstructionEngine`]: the sequential position-by-position attack
//! - [`AttackController`]: `start()`/`abort()` over background runs
//! - [`ReconstructionState`] and [`EngineSnapshot`]: what observers see
//! - [`RollingLog`]: the capped status log

mod controller;
mod engine;
mod log;
mod state;

pub use controller::AttackController;
pub use engine::{AbortSignal, ReconstructionEngine};
pub use log::{RollingLog, DEFAULT_LOG_CAPACITY};
pub use state::{AttackReport, EngineSnapshot, ReconstructionState};
