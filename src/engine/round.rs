//! A single round and its state transitions.
//!
//! `Round` is plain data with no clock and no locking: the engine owns one
//! behind its mutex and the tick task calls [`Round::advance`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::types::{round2, CrashError, LockIn, RoundOutcome, RoundState};

/// What one tick did to the round.
#[derive(Debug, Clone, PartialEq)]
pub enum TickStep {
    /// Still running at the new multiplier.
    Climbing(Decimal),
    /// Reached the crash point on this tick.
    Crashed(RoundOutcome),
    /// The round was not running; nothing changed.
    Stopped,
}

#[derive(Debug, Clone)]
pub struct Round {
    id: Uuid,
    state: RoundState,
    wager: Decimal,
    multiplier: Decimal,
    crash_point: Option<Decimal>,
    lock_in_multiplier: Option<Decimal>,
    payout: Decimal,
    started_at: Option<DateTime<Utc>>,
    settled_at: Option<DateTime<Utc>>,
}

impl Default for Round {
    fn default() -> Self {
        Self::idle()
    }
}

impl Round {
    /// The placeholder round before anything has been played.
    pub fn idle() -> Self {
        Self {
            id: Uuid::nil(),
            state: RoundState::Idle,
            wager: Decimal::ZERO,
            multiplier: Decimal::ONE,
            crash_point: None,
            lock_in_multiplier: None,
            payout: Decimal::ZERO,
            started_at: None,
            settled_at: None,
        }
    }

    /// A freshly started round at 1.00x.
    pub fn running(wager: Decimal, crash_point: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: RoundState::Running,
            wager,
            multiplier: Decimal::ONE,
            crash_point: Some(crash_point),
            lock_in_multiplier: None,
            payout: Decimal::ZERO,
            started_at: Some(Utc::now()),
            settled_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn wager(&self) -> Decimal {
        self.wager
    }

    pub fn multiplier(&self) -> Decimal {
        self.multiplier
    }

    /// The secret crash point. Callers decide whether it may be shown.
    pub fn crash_point(&self) -> Option<Decimal> {
        self.crash_point
    }

    pub fn locked_in(&self) -> bool {
        self.lock_in_multiplier.is_some()
    }

    pub fn lock_in_multiplier(&self) -> Option<Decimal> {
        self.lock_in_multiplier
    }

    pub fn payout(&self) -> Decimal {
        self.payout
    }

    /// Claim the current multiplier. Rejections leave the round untouched.
    pub fn lock_in(&mut self) -> Result<LockIn, CrashError> {
        if !self.state.is_running() {
            return Err(CrashError::NoActiveRound);
        }
        if self.locked_in() {
            return Err(CrashError::AlreadyLockedIn);
        }

        // Saturates instead of overflowing; the engine bounds wagers well below this.
        let payout = self
            .wager
            .checked_mul(self.multiplier)
            .map(round2)
            .unwrap_or(Decimal::MAX);
        self.lock_in_multiplier = Some(self.multiplier);
        self.payout = payout;

        Ok(LockIn {
            payout,
            multiplier: self.multiplier,
        })
    }

    /// Grow the multiplier one step and settle if it reached the crash point.
    pub fn advance(&mut self, growth_factor: Decimal) -> TickStep {
        if !self.state.is_running() {
            return TickStep::Stopped;
        }
        let Some(crash_point) = self.crash_point else {
            return TickStep::Stopped;
        };

        self.multiplier = self
            .multiplier
            .checked_mul(growth_factor)
            .map(round2)
            .unwrap_or(crash_point);
        if self.multiplier < crash_point {
            return TickStep::Climbing(self.multiplier);
        }

        self.state = RoundState::Settled;
        self.settled_at = Some(Utc::now());
        if !self.locked_in() {
            self.payout = Decimal::ZERO;
        }

        match self.outcome() {
            Some(outcome) => TickStep::Crashed(outcome),
            None => TickStep::Stopped,
        }
    }

    /// Final record, once settled.
    pub fn outcome(&self) -> Option<RoundOutcome> {
        if self.state != RoundState::Settled {
            return None;
        }
        Some(RoundOutcome {
            round_id: self.id,
            wager: self.wager,
            crash_point: self.crash_point?,
            lock_in_multiplier: self.lock_in_multiplier,
            payout: self.payout,
            started_at: self.started_at.unwrap_or_else(Utc::now),
            settled_at: self.settled_at.unwrap_or_else(Utc::now),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
