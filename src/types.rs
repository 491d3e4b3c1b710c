//! Shared types for the CRASH engine.
//!
//! These types form the data model passed between the engine, the
//! settlement listener and the HTTP layer.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Round a multiplier or money amount to two decimal places.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Round state
// ---------------------------------------------------------------------------

/// Lifecycle tag of the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RoundState {
    /// No round has been played yet.
    #[default]
    #[serde(rename = "waiting")]
    Idle,
    #[serde(rename = "running")]
    Running,
    /// The multiplier reached the crash point.
    #[serde(rename = "crashed")]
    Settled,
}

impl RoundState {
    pub fn is_running(&self) -> bool {
        *self == RoundState::Running
    }
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundState::Idle => write!(f, "WAITING"),
            RoundState::Running => write!(f, "RUNNING"),
            RoundState::Settled => write!(f, "CRASHED"),
        }
    }
}

// ---------------------------------------------------------------------------
// Operation results
// ---------------------------------------------------------------------------

/// Confirmation returned by a successful start.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundStarted {
    pub round_id: Uuid,
    pub wager: Decimal,
    /// Only populated when the disclosure policy allows it.
    pub crash_point: Option<Decimal>,
}

/// Result of a successful lock-in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockIn {
    pub payout: Decimal,
    pub multiplier: Decimal,
}

/// Read-only view of the current round, serialized as the state endpoint body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSnapshot {
    pub game_state: RoundState,
    pub multiplier: Decimal,
    /// `None` while the crash point is still secret.
    pub crash_point: Option<Decimal>,
    pub cashed_out: bool,
    pub winnings: Decimal,
    pub cashout_multiplier: Option<Decimal>,
    /// Most recent first.
    pub history: Vec<Decimal>,
    pub bet: Decimal,
}

/// Final record of a settled round, handed to the settlement listener.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundOutcome {
    pub round_id: Uuid,
    pub wager: Decimal,
    pub crash_point: Decimal,
    pub lock_in_multiplier: Option<Decimal>,
    pub payout: Decimal,
    pub started_at: DateTime<Utc>,
    pub settled_at: DateTime<Utc>,
}

impl RoundOutcome {
    pub fn won(&self) -> bool {
        self.lock_in_multiplier.is_some()
    }

    /// Net change to the participant's balance (payout minus wager).
    pub fn balance_delta(&self) -> Decimal {
        self.payout - self.wager
    }

    /// Wall-clock time from start to crash.
    pub fn duration(&self) -> chrono::Duration {
        self.settled_at - self.started_at
    }
}

impl fmt::Display for RoundOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lock_in_multiplier {
            Some(m) => write!(
                f,
                "Round {} crashed at {}x, cashed out at {}x: {} -> {}",
                self.round_id, self.crash_point, m, self.wager, self.payout
            ),
            None => write!(
                f,
                "Round {} crashed at {}x, lost {}",
                self.round_id, self.crash_point, self.wager
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Rejections of round operations. None of them mutate the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CrashError {
    #[error("A round is already running")]
    RoundAlreadyActive,

    #[error("No round is running")]
    NoActiveRound,

    #[error("Already cashed out this round")]
    AlreadyLockedIn,
}

impl CrashError {
    /// Stable machine-readable name.
    pub fn code(&self) -> &'static str {
        match self {
            CrashError::RoundAlreadyActive => "RoundAlreadyActive",
            CrashError::NoActiveRound => "NoActiveRound",
            CrashError::AlreadyLockedIn => "AlreadyLockedIn",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
