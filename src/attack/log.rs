//! Capped, drop-oldest buffer of human-readable status lines.

use std::collections::VecDeque;

use serde::Serialize;

use crate::config::ConfigError;

/// Default number of retained lines.
pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// Rolling log shown next to the attack.
///
/// Never holds more than `capacity` lines; appending to a full log drops the
/// oldest line. Remaining lines keep their order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollingLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for RollingLog {
    fn default() -> Self {
        Self::with_capacity_unchecked(DEFAULT_LOG_CAPACITY)
    }
}

impl RollingLog {
    /// Create an empty log holding at most `capacity` lines.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroLogCapacity);
        }
        Ok(Self::with_capacity_unchecked(capacity))
    }

    fn with_capacity_unchecked(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a line, evicting the oldest ones past capacity.
    pub fn append(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
        while self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Retained lines, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Most recent line.
    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    /// Number of retained lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Maximum number of retained lines.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy of the retained lines, oldest first.
    pub fn to_vec(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}
