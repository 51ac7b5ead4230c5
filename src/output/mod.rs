//! Output formatting for attack and trial reports.
//!
//! This module provides formatters for displaying reports in different formats:
//! - Terminal: Human-readable output with colors and box drawing
//! - JSON: Machine-readable serialization

mod json;
mod terminal;

pub use json::{to_json, to_json_pretty};
pub use terminal::{format_attack_report, format_mode_comparison, format_trial_report};
