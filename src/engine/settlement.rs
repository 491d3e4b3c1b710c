//! Settlement hook.
//!
//! The engine knows nothing about accounts. Whatever owns balances
//! implements [`SettlementListener`] and applies
//! [`RoundOutcome::balance_delta`] when a round crashes.

use tracing::info;

use crate::types::RoundOutcome;

#[cfg_attr(test, mockall::automock)]
pub trait SettlementListener: Send + Sync {
    /// Called once per round, after the engine lock is released.
    fn round_settled(&self, outcome: &RoundOutcome);
}

/// Default listener: records each outcome as a structured log event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSettlements;

impl SettlementListener for LogSettlements {
    fn round_settled(&self, outcome: &RoundOutcome) {
        info!(
            round_id = %outcome.round_id,
            wager = %outcome.wager,
            crash_point = %outcome.crash_point,
            cashout_multiplier = ?outcome.lock_in_multiplier,
            payout = %outcome.payout,
            balance_delta = %outcome.balance_delta(),
            duration_ms = outcome.duration().num_milliseconds(),
            "Round settled"
        );
    }
}
