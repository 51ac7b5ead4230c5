//! Shared data types for comparisons, oracle calls and attack rounds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Ordered set of symbols a secret is drawn from.
///
/// Order matters: the reconstruction engine tries symbols in this order and
/// breaks latency ties in favour of the earlier symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Alphabet {
    symbols: Vec<u8>,
}

impl Alphabet {
    /// Lowercase hexadecimal digits, `0-9a-f`.
    pub fn hex() -> Self {
        Self {
            symbols: b"0123456789abcdef".to_vec(),
        }
    }

    /// Printable ASCII, space through `~`.
    pub fn printable() -> Self {
        Self {
            symbols: (b' '..=b'~').collect(),
        }
    }

    /// Build an alphabet from explicit symbols.
    ///
    /// Rejects an empty list and repeated symbols.
    pub fn new(symbols: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let symbols = symbols.into();
        if symbols.is_empty() {
            return Err(ConfigError::EmptyAlphabet);
        }
        for (i, s) in symbols.iter().enumerate() {
            if symbols[..i].contains(s) {
                return Err(ConfigError::DuplicateSymbol(*s as char));
            }
        }
        Ok(Self { symbols })
    }

    /// Symbols in trial order.
    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false for a validated alphabet.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Whether `symbol` belongs to the alphabet.
    pub fn contains(&self, symbol: u8) -> bool {
        self.symbols.contains(&symbol)
    }
}

impl TryFrom<Vec<u8>> for Alphabet {
    type Error = ConfigError;

    fn try_from(symbols: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(symbols)
    }
}

impl From<Alphabet> for Vec<u8> {
    fn from(alphabet: Alphabet) -> Self {
        alphabet.symbols
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::hex()
    }
}

/// The value held by the simulated verifier.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretValue(Vec<u8>);

impl SecretValue {
    /// Wrap raw symbols.
    pub fn new(symbols: impl Into<Vec<u8>>) -> Self {
        Self(symbols.into())
    }

    /// Symbols of the secret.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a zero-length secret.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check that the secret is non-empty and drawn from `alphabet`.
    pub fn validate(&self, alphabet: &Alphabet) -> Result<(), ConfigError> {
        if self.0.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        match self.0.iter().position(|s| !alphabet.contains(*s)) {
            Some(position) => Err(ConfigError::SymbolOutsideAlphabet {
                position,
                symbol: self.0[position] as char,
            }),
            None => Ok(()),
        }
    }
}

impl From<&str> for SecretValue {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

// Secrets never print their content through Debug.
impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue(len={})", self.0.len())
    }
}

/// Result of one comparator invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonOutcome {
    /// Whether the candidate equals the secret.
    pub matched: bool,
    /// Simulated time spent, in milliseconds.
    pub elapsed_ms: f64,
    /// Number of leading symbols that matched before the comparator stopped.
    ///
    /// Only the early-exit comparator knows this; the constant-time one
    /// reports `None`.
    pub match_prefix_length: Option<usize>,
}

/// What a remote verifier exposes: a verdict and how long it took.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    /// Whether the candidate was accepted.
    pub ok: bool,
    /// Response latency in milliseconds.
    pub latency_ms: f64,
}

/// Latency observed for a single candidate symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateMeasurement {
    /// Symbol placed at the attacked position.
    pub symbol: u8,
    /// Latency attributed to this symbol.
    pub elapsed_ms: f64,
    /// Ground truth annotation for display. Never used for selection.
    pub is_correct_internally: bool,
}

/// Outcome of selecting a symbol at the end of a round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RoundVerdict {
    /// One symbol stood out from the rest of the round.
    Leak {
        /// Slowest symbol, first in alphabet order on ties.
        symbol: u8,
        /// Its latency.
        latency_ms: f64,
        /// How far it sat above the round median.
        margin_ms: f64,
    },
    /// No symbol stood out. The slowest one is still written to the position,
    /// which under a constant-time verifier is as good as a random guess.
    NoSignal {
        /// `max - min` across the round.
        spread_ms: f64,
        /// Slowest symbol, first in alphabet order on ties.
        symbol: u8,
    },
}

impl RoundVerdict {
    /// Symbol written to the attacked position.
    pub fn chosen(&self) -> u8 {
        match *self {
            RoundVerdict::Leak { symbol, .. } | RoundVerdict::NoSignal { symbol, .. } => symbol,
        }
    }

    /// Whether the round carried a timing signal.
    pub fn is_leak(&self) -> bool {
        matches!(self, RoundVerdict::Leak { .. })
    }
}

/// One pass over the alphabet for a single position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackRound {
    /// Attacked position.
    pub position: usize,
    /// Measurements in alphabet order.
    pub candidates: Vec<CandidateMeasurement>,
    /// Selection result, `None` while the round is still being measured.
    pub verdict: Option<RoundVerdict>,
}

impl AttackRound {
    pub(crate) fn new(position: usize, capacity: usize) -> Self {
        Self {
            position,
            candidates: Vec::with_capacity(capacity),
            verdict: None,
        }
    }
}

/// Lifecycle of an attack run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackStatus {
    /// Not started.
    Idle,
    /// Rounds in progress.
    Running,
    /// Final verification accepted the reconstructed value.
    Success,
    /// Final verification rejected the reconstructed value.
    Fail,
    /// Stopped by the caller before finishing.
    Aborted,
}

impl AttackStatus {
    /// True for `Success`, `Fail` and `Aborted`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttackStatus::Success | AttackStatus::Fail | AttackStatus::Aborted
        )
    }
}

impl fmt::Display for AttackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttackStatus::Idle => "idle",
            AttackStatus::Running => "running",
            AttackStatus::Success => "success",
            AttackStatus::Fail => "fail",
            AttackStatus::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_alphabet_order() {
        let a = Alphabet::hex();
        assert_eq!(a.len(), 16);
        assert_eq!(a.symbols()[0], b'0');
        assert_eq!(a.symbols()[15], b'f');
    }

    #[test]
    fn printable_alphabet_bounds() {
        let a = Alphabet::printable();
        assert_eq!(a.len(), 95);
        assert!(a.contains(b' '));
        assert!(a.contains(b'~'));
        assert!(!a.contains(b'\n'));
    }

    #[test]
    fn empty_alphabet_rejected() {
        assert_eq!(Alphabet::new(Vec::<u8>::new()), Err(ConfigError::EmptyAlphabet));
    }

    #[test]
    fn deserialize_checks_symbols() {
        let a: Alphabet = serde_json::from_str("[97, 98]").unwrap();
        assert_eq!(a.symbols(), b"ab");
        assert_eq!(serde_json::to_string(&a).unwrap(), "[97,98]");

        assert!(serde_json::from_str::<Alphabet>("[97, 97]").is_err());
        assert!(serde_json::from_str::<Alphabet>("[]").is_err());
    }

    #[test]
    fn duplicate_symbol_rejected() {
        assert_eq!(
            Alphabet::new(b"abca".to_vec()),
            Err(ConfigError::DuplicateSymbol('a'))
        );
    }

    #[test]
    fn secret_outside_alphabet() {
        let secret = SecretValue::from("b7g2");
        assert_eq!(
            secret.validate(&Alphabet::hex()),
            Err(ConfigError::SymbolOutsideAlphabet {
                position: 2,
                symbol: 'g'
            })
        );
    }

    #[test]
    fn secret_debug_hides_content() {
        let secret = SecretValue::from("b7f2a9c4");
        let shown = format!("{:?}", secret);
        assert!(!shown.contains("b7f2"));
        assert!(shown.contains("len=8"));
    }
}
