//! Reconstruction state and the snapshots published to observers.

use serde::{Deserialize, Serialize};

use crate::types::{AttackRound, AttackStatus};

/// Progress of one reconstruction run.
///
/// Created when a run starts, advanced one position at a time by the engine
/// and frozen once the status is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructionState {
    /// Symbols fixed so far; `None` for positions not yet attacked.
    pub confirmed: Vec<Option<u8>>,
    /// Position currently under attack. Equals the secret length once every
    /// position is fixed.
    pub current_position: usize,
    /// Lifecycle status.
    pub status: AttackStatus,
}

impl Default for ReconstructionState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ReconstructionState {
    /// Idle state for a secret of `len` symbols.
    pub fn new(len: usize) -> Self {
        Self {
            confirmed: vec![None; len],
            current_position: 0,
            status: AttackStatus::Idle,
        }
    }

    /// Fix `symbol` at `position` and move on to the next position.
    pub(crate) fn confirm(&mut self, position: usize, symbol: u8) {
        self.confirmed[position] = Some(symbol);
        self.current_position = position + 1;
    }

    /// Number of fixed positions.
    pub fn confirmed_count(&self) -> usize {
        self.confirmed.iter().filter(|s| s.is_some()).count()
    }

    /// Render the value with `placeholder` at unknown positions.
    pub fn render(&self, placeholder: u8) -> String {
        self.confirmed
            .iter()
            .map(|s| s.unwrap_or(placeholder) as char)
            .collect()
    }

    /// The full value, if every position is fixed.
    pub fn recovered(&self) -> Option<Vec<u8>> {
        self.confirmed.iter().copied().collect()
    }
}

/// Everything an observer can see after an engine step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Current reconstruction state.
    pub state: ReconstructionState,
    /// The round being measured, or the last finished one.
    pub latest_round: Option<AttackRound>,
    /// Symbol most recently sent to the oracle.
    pub trying: Option<u8>,
    /// Retained log lines, oldest first.
    pub log: Vec<String>,
}

/// Summary of a finished (or aborted) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackReport {
    /// Terminal status.
    pub status: AttackStatus,
    /// Final reconstruction state.
    pub state: ReconstructionState,
    /// Rendered value, filler at unknown positions.
    pub recovered: String,
    /// Every completed round, in position order.
    pub rounds: Vec<AttackRound>,
    /// Rounds whose pick came from a timing signal.
    pub leaked_positions: usize,
    /// Oracle calls issued, including the final verification.
    pub oracle_calls: u64,
}

impl AttackReport {
    /// True if the final verification accepted the reconstructed value.
    pub fn succeeded(&self) -> bool {
        self.status == AttackStatus::Success
    }

    /// True if every round reported "no timing difference observed".
    pub fn no_signal(&self) -> bool {
        !self.rounds.is_empty() && self.leaked_positions == 0
    }
}
