//! Round lifecycle through `RoundEngine` with a manually driven clock.

use crash::config::EngineConfig;
use crash::engine::sampler::{CrashPointSampler, ScriptedSource};
use crash::engine::scheduler::ManualScheduler;
use crash::engine::RoundEngine;
use crash::types::{CrashError, RoundState};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

use crate::mock_accounts::MockAccounts;

fn engine(draws: Vec<f64>, accounts: &MockAccounts) -> (RoundEngine, ManualScheduler) {
    let ticks = ManualScheduler::new();
    let engine = RoundEngine::new(EngineConfig::default(), Arc::new(ticks.clone()))
        .with_sampler(CrashPointSampler::new(ScriptedSource::new(draws)))
        .with_listener(Arc::new(accounts.clone()));
    (engine, ticks)
}

#[test]
fn test_cash_out_then_crash() {
    let accounts = MockAccounts::new(dec!(1000));
    // u = 0.9, u3 = 0.5 -> crash at 4.25x
    let (engine, ticks) = engine(vec![0.9, 0.5], &accounts);

    let started = assert_ok!(engine.start(Some(dec!(50))));
    let snap = engine.snapshot();
    assert_eq!(snap.game_state, RoundState::Running);
    assert_eq!(snap.multiplier, dec!(1.00));
    assert!(!snap.cashed_out);

    while engine.snapshot().multiplier < dec!(1.05) {
        ticks.fire();
    }
    let lock_in = assert_ok!(engine.attempt_lock_in());
    assert_eq!(lock_in.payout, dec!(52.50));
    assert_eq!(assert_err!(engine.attempt_lock_in()), CrashError::AlreadyLockedIn);

    ticks.fire_until_idle(1_000);
    let snap = engine.snapshot();
    assert_eq!(snap.game_state, RoundState::Settled);
    assert_eq!(snap.winnings, dec!(52.50));
    assert_eq!(snap.crash_point, Some(dec!(4.25)));
    assert_eq!(snap.history, vec![dec!(4.25)]);

    let outcomes = accounts.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].round_id, started.round_id);
    assert_eq!(accounts.balance(), dec!(1002.50));
}

#[test]
fn test_bust_without_cash_out() {
    let accounts = MockAccounts::new(dec!(100));
    let (engine, ticks) = engine(vec![0.0], &accounts);

    assert_ok!(engine.start(Some(dec!(10))));
    ticks.fire();

    let snap = engine.snapshot();
    assert_eq!(snap.game_state, RoundState::Settled);
    assert_eq!(snap.winnings, Decimal::ZERO);
    assert_eq!(snap.cashout_multiplier, None);
    assert_eq!(accounts.balance(), dec!(90));
    assert_eq!(
        assert_err!(engine.attempt_lock_in()),
        CrashError::NoActiveRound
    );
}

#[test]
fn test_start_rejected_while_running_keeps_round() {
    let accounts = MockAccounts::new(dec!(100));
    let (engine, ticks) = engine(vec![0.9, 0.5], &accounts);

    assert_ok!(engine.start(Some(dec!(10))));
    ticks.fire();
    let before = engine.snapshot();
    assert_eq!(
        assert_err!(engine.start(Some(dec!(20)))),
        CrashError::RoundAlreadyActive
    );
    assert_eq!(engine.snapshot(), before);
    assert!(accounts.outcomes().is_empty());
}

#[test]
fn test_history_keeps_last_ten_rounds() {
    let accounts = MockAccounts::new(dec!(1000));
    // Round 1: 0.5/0.42 -> 1.42x, then rounds 2..=11 in the high band.
    let mut draws = vec![0.5, 0.42];
    for i in 0..10 {
        draws.extend([0.9, i as f64 / 10.0]);
    }
    let (engine, ticks) = engine(draws, &accounts);

    for _ in 0..11 {
        assert_ok!(engine.start(None));
        ticks.fire_until_idle(10_000);
        assert!(!engine.is_running());
    }

    let history = engine.snapshot().history;
    assert_eq!(history.len(), 10);
    assert!(!history.contains(&dec!(1.42)));
    // Most recent first: the last round drew u3 = 0.9 -> 6.05x.
    assert_eq!(history[0], dec!(6.05));
    assert_eq!(history[9], dec!(2.00));
    assert_eq!(accounts.outcomes().len(), 11);
    assert_eq!(accounts.balance(), dec!(890));
}
