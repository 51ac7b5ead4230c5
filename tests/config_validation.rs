//! Tests for configuration validation.
//!
//! Invalid values are reported as `ConfigError` by `validate()` and by every
//! constructor that schedules work, before any simulated time is spent.

use std::time::Duration;

use timing_attack_sim::{
    run_trials, Alphabet, AttackConfig, AttackController, ComparatorConfig, ComparatorMode,
    ConfigError, ReconstructionEngine, SecretValue, SimulatedServer, TrialConfig, MAX_DELAY_MS,
};

// =============================================================================
// ALPHABET
// =============================================================================

#[test]
fn empty_alphabet_rejected() {
    assert_eq!(Alphabet::new(Vec::<u8>::new()), Err(ConfigError::EmptyAlphabet));
}

#[test]
fn duplicate_symbol_rejected() {
    assert_eq!(
        Alphabet::new(b"abca".to_vec()),
        Err(ConfigError::DuplicateSymbol('a'))
    );
}

#[test]
fn builtin_alphabets() {
    assert_eq!(Alphabet::hex().len(), 16);
    assert_eq!(Alphabet::printable().len(), 95);
    assert_eq!(Alphabet::default(), Alphabet::hex());
}

// =============================================================================
// SECRET
// =============================================================================

#[test]
fn secret_outside_alphabet_rejected() {
    let secret = SecretValue::from("b7g2");
    assert_eq!(
        secret.validate(&Alphabet::hex()),
        Err(ConfigError::SymbolOutsideAlphabet {
            position: 2,
            symbol: 'g'
        })
    );
    assert!(SecretValue::from("b7f2").validate(&Alphabet::hex()).is_ok());
}

#[test]
fn secret_debug_hides_content() {
    let debug = format!("{:?}", SecretValue::from("b7f2a9c4"));
    assert!(!debug.contains("b7f2"));
}

#[test]
fn empty_secret_rejected_by_server() {
    assert_eq!(
        SimulatedServer::new("", ComparatorConfig::default(), 0).err(),
        Some(ConfigError::EmptySecret)
    );
}

// =============================================================================
// COMPARATOR
// =============================================================================

#[test]
fn comparator_ranges() {
    let base = ComparatorConfig::default();
    assert_eq!(
        base.clone().per_unit_delay_ms(-1.0).validate(),
        Err(ConfigError::NonPositiveDelay(-1.0))
    );
    assert_eq!(
        base.clone().noise_range_ms(-0.5).validate(),
        Err(ConfigError::InvalidNoise(-0.5))
    );
    assert_eq!(
        base.clone().base_latency_ms(-3.0).validate(),
        Err(ConfigError::InvalidBaseLatency(-3.0))
    );
    assert_eq!(
        base.clone().fixed_length(0).validate(),
        Err(ConfigError::ZeroFixedLength)
    );
    assert!(matches!(
        base.per_unit_delay_ms(f64::NAN).validate(),
        Err(ConfigError::NonPositiveDelay(_))
    ));
}

#[test]
fn secure_loop_must_cover_secret() {
    let cfg = ComparatorConfig::secure(6);
    assert_eq!(cfg.mode, ComparatorMode::Secure);
    assert!(cfg.validate_for(6).is_ok());
    assert_eq!(
        cfg.validate_for(8),
        Err(ConfigError::FixedLengthTooShort {
            fixed_length: 6,
            secret_len: 8
        })
    );
    // The early-exit comparator has no loop length to check.
    assert!(ComparatorConfig::vulnerable().fixed_length(1).validate_for(8).is_ok());
}

// =============================================================================
// ATTACK
// =============================================================================

#[test]
fn filler_must_be_in_alphabet() {
    let cfg = AttackConfig::default().filler(b'z');
    assert_eq!(cfg.validate(), Err(ConfigError::FillerOutsideAlphabet('z')));
}

#[test]
fn setting_alphabet_resets_filler() {
    let alphabet = Alphabet::new(b"xyz".to_vec()).unwrap();
    let cfg = AttackConfig::default().alphabet(alphabet);
    assert_eq!(cfg.filler, b'x');
    assert!(cfg.validate().is_ok());
}

#[test]
fn attack_ranges() {
    assert_eq!(
        AttackConfig::default().leak_threshold_ms(-1.0).validate(),
        Err(ConfigError::InvalidLeakThreshold(-1.0))
    );
    assert_eq!(
        AttackConfig::default().log_capacity(0).validate(),
        Err(ConfigError::ZeroLogCapacity)
    );
}

#[test]
fn paced_preset() {
    let cfg = AttackConfig::paced();
    assert_eq!(cfg.candidate_pause, Duration::from_millis(15));
    assert_eq!(cfg.round_pause, Duration::from_millis(100));
}

#[test]
fn engine_and_controller_validate() {
    let server = |seed: u64| SimulatedServer::new("b7f2", ComparatorConfig::default(), seed).unwrap();
    let bad = AttackConfig::default().leak_threshold_ms(f64::INFINITY);
    assert!(matches!(
        ReconstructionEngine::new(bad.clone(), server(0)).err(),
        Some(ConfigError::InvalidLeakThreshold(_))
    ));
    assert!(matches!(
        AttackController::new(bad, server).err(),
        Some(ConfigError::InvalidLeakThreshold(_))
    ));
}

// =============================================================================
// TRIALS
// =============================================================================

#[test]
fn trial_ranges() {
    assert_eq!(
        TrialConfig::default().trial_count(0).validate(),
        Err(ConfigError::NonPositiveTrialCount)
    );
    assert_eq!(
        TrialConfig::default().bins(0).validate(),
        Err(ConfigError::ZeroBins)
    );
    assert_eq!(
        TrialConfig::default().max_ms(0.0).validate(),
        Err(ConfigError::NonPositiveRange(0.0))
    );
}

#[tokio::test(start_paused = true)]
async fn trials_reject_short_secure_loop() {
    let err = run_trials(b"abc", b"abcdef", &ComparatorConfig::secure(3), &TrialConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::FixedLengthTooShort { .. }));
}

#[test]
fn errors_render_messages() {
    assert_eq!(
        ConfigError::NonPositiveDelay(0.0).to_string(),
        "per_unit_delay_ms must be > 0, got 0"
    );
    assert_eq!(ConfigError::EmptySecret.to_string(), "secret must not be empty");
}

#[test]
fn oversized_delay_rejected_by_server() {
    let cfg = ComparatorConfig::vulnerable().per_unit_delay_ms(1e300);
    assert!(matches!(
        SimulatedServer::new("b7f2", cfg, 0).err(),
        Some(ConfigError::DelayTooLarge { field: "per_unit_delay_ms", .. })
    ));
    assert!(ComparatorConfig::vulnerable()
        .per_unit_delay_ms(MAX_DELAY_MS)
        .validate()
        .is_ok());
}
