//! The verifier side of the attack: an opaque "ask the server" primitive.

use std::future::Future;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::comparator;
use crate::config::{ComparatorConfig, ComparatorMode, ConfigError};
use crate::types::{SecretValue, Verification};

/// Something that accepts or rejects a candidate and takes time doing it.
///
/// The reconstruction engine only ever sees [`Verification`]: a verdict and a
/// latency. Matched-prefix information must not cross this boundary.
pub trait VerificationOracle {
    /// Verify `candidate`, resolving once the verifier's latency has elapsed.
    ///
    /// Dropping the returned future does not cancel anything observable; the
    /// engine lets in-flight calls finish and discards their result after an
    /// abort.
    fn verify(&mut self, candidate: &[u8]) -> impl Future<Output = Verification> + Send;

    /// Length of the value being verified. Public, like an HMAC tag length.
    fn secret_len(&self) -> usize;

    /// Whether `symbol` is the true symbol at `position`.
    ///
    /// Only used to annotate measurements for display. Oracles that do not
    /// know return `None`.
    fn ground_truth(&self, _position: usize, _symbol: u8) -> Option<bool> {
        None
    }
}

/// In-process verifier backed by the comparator model.
#[derive(Debug, Clone)]
pub struct SimulatedServer {
    secret: SecretValue,
    config: ComparatorConfig,
    rng: Xoshiro256PlusPlus,
    calls: u64,
}

impl SimulatedServer {
    /// Create a server holding `secret`, with noise drawn from `seed`.
    pub fn new(
        secret: impl Into<SecretValue>,
        config: ComparatorConfig,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        config.validate_for(secret.len())?;
        Ok(Self {
            secret,
            config,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            calls: 0,
        })
    }

    /// Switch between the early-exit and fixed-length comparator.
    pub fn set_mode(&mut self, mode: ComparatorMode) -> Result<(), ConfigError> {
        let config = self.config.clone().mode(mode);
        config.validate_for(self.secret.len())?;
        self.config = config;
        Ok(())
    }

    /// Current comparator settings.
    pub fn config(&self) -> &ComparatorConfig {
        &self.config
    }

    /// Number of `verify` calls served so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl VerificationOracle for SimulatedServer {
    async fn verify(&mut self, candidate: &[u8]) -> Verification {
        self.calls += 1;
        let outcome =
            comparator::compare(candidate, self.secret.as_bytes(), &self.config, &mut self.rng)
                .await;
        Verification {
            ok: outcome.matched,
            latency_ms: outcome.elapsed_ms,
        }
    }

    fn secret_len(&self) -> usize {
        self.secret.len()
    }

    fn ground_truth(&self, position: usize, symbol: u8) -> Option<bool> {
        self.secret.as_bytes().get(position).map(|&s| s == symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_secret() {
        let err = SimulatedServer::new("", ComparatorConfig::default(), 0).unwrap_err();
        assert_eq!(err, ConfigError::EmptySecret);
    }

    #[test]
    fn rejects_short_secure_loop() {
        let err = SimulatedServer::new("b7f2a9c4", ComparatorConfig::secure(4), 0).unwrap_err();
        assert!(matches!(err, ConfigError::FixedLengthTooShort { .. }));
    }

    #[test]
    fn set_mode_validates() {
        let cfg = ComparatorConfig::vulnerable().fixed_length(2);
        let mut server = SimulatedServer::new("b7f2", cfg, 0).unwrap();
        assert!(server.set_mode(ComparatorMode::Secure).is_err());
        assert_eq!(server.config().mode, ComparatorMode::Vulnerable);
    }

    #[test]
    fn ground_truth_per_position() {
        let server = SimulatedServer::new("b7", ComparatorConfig::default(), 0).unwrap();
        assert_eq!(server.ground_truth(0, b'b'), Some(true));
        assert_eq!(server.ground_truth(1, b'b'), Some(false));
        assert_eq!(server.ground_truth(2, b'b'), None);
    }

    #[tokio::test(start_paused = true)]
    async fn verify_reports_latency_only() {
        let mut server =
            SimulatedServer::new("b7f2a9c4", ComparatorConfig::vulnerable(), 0).unwrap();
        let v = server.verify(b"b7000000").await;
        assert!(!v.ok);
        assert_eq!(v.latency_ms, 15.0 + 2.0 * 40.0);
        let v = server.verify(b"b7f2a9c4").await;
        assert!(v.ok);
        assert_eq!(server.calls(), 2);
    }
}
