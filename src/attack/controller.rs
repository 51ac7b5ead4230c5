//! Start/abort control over background reconstruction runs.

use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::engine::{AbortSignal, ReconstructionEngine};
use super::state::{AttackReport, EngineSnapshot};
use crate::config::{AttackConfig, ConfigError};
use crate::oracle::VerificationOracle;

/// Owns at most one running attack and the channel observers watch.
///
/// Each `start()` builds a fresh oracle from the factory and a fresh engine,
/// so nothing carries over between runs. The factory receives the run's seed,
/// `config.seed + run_index`. Both control operations are no-ops
/// outside the state they apply to: starting while running does nothing, and
/// so does aborting while idle.
pub struct AttackController<O, F> {
    config: AttackConfig,
    factory: F,
    publisher: Arc<watch::Sender<EngineSnapshot>>,
    abort: AbortSignal,
    task: Option<JoinHandle<AttackReport>>,
    runs: u64,
    _oracle: PhantomData<fn() -> O>,
}

impl<O, F> AttackController<O, F>
where
    O: VerificationOracle + Send + 'static,
    F: FnMut(u64) -> O,
{
    /// Validate `config` and create an idle controller.
    pub fn new(config: AttackConfig, factory: F) -> Result<Self, ConfigError> {
        config.validate()?;
        let (tx, _rx) = watch::channel(EngineSnapshot::default());
        Ok(Self {
            config,
            factory,
            publisher: Arc::new(tx),
            abort: AbortSignal::new(),
            task: None,
            runs: 0,
            _oracle: PhantomData,
        })
    }

    /// Spawn a new run on the current Tokio runtime.
    ///
    /// Returns `Ok(false)` without doing anything if a run is in progress.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(&mut self) -> Result<bool, ConfigError> {
        if self.is_running() {
            tracing::debug!("start ignored: attack already running");
            return Ok(false);
        }

        let seed = self.config.seed.wrapping_add(self.runs);
        let config = self.config.clone().seed(seed);
        let abort = AbortSignal::new();
        let mut engine = ReconstructionEngine::with_publisher(
            config,
            (self.factory)(seed),
            abort.clone(),
            Arc::clone(&self.publisher),
        )?;

        self.runs += 1;
        self.abort = abort;
        self.task = Some(tokio::spawn(async move { engine.run().await }));
        Ok(true)
    }

    /// Ask the current run to stop at its next checkpoint.
    ///
    /// Returns `false` (and does nothing) when no run is in progress.
    pub fn abort(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.abort.abort();
        true
    }

    /// Whether a run has been started and has not finished.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |t| !t.is_finished())
    }

    /// Receive a snapshot after every engine step.
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.publisher.subscribe()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.publisher.borrow().clone()
    }

    /// Wait for the current run and return its report.
    ///
    /// Returns `None` if nothing was started since the last `wait()`.
    pub async fn wait(&mut self) -> Option<AttackReport> {
        let task = self.task.take()?;
        match task.await {
            Ok(report) => Some(report),
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => None,
        }
    }

    /// Number of runs started so far.
    pub fn runs(&self) -> u64 {
        self.runs
    }
}
