//! Round engine: owns the current round and drives its tick loop.
//!
//! All round state sits behind one mutex. Public operations and the tick
//! task are short critical sections over it, so a cash-out can never
//! observe a half-applied tick.

pub mod history;
pub mod round;
pub mod sampler;
pub mod scheduler;
pub mod settlement;

use rust_decimal::Decimal;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::config::{CrashPointDisclosure, EngineConfig};
use crate::types::{CrashError, LockIn, RoundSnapshot, RoundStarted, RoundState};
use history::CrashHistory;
use round::{Round, TickStep};
use sampler::CrashPointSampler;
use scheduler::{TickHandle, TickScheduler, TickTask};
use settlement::{LogSettlements, SettlementListener};

struct EngineState {
    round: Round,
    history: CrashHistory,
    sampler: CrashPointSampler,
    ticker: Option<Box<dyn TickHandle>>,
}

impl EngineState {
    fn cancel_ticker(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }
}

fn lock(shared: &Mutex<EngineState>) -> MutexGuard<'_, EngineState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct RoundEngine {
    config: EngineConfig,
    growth_factor: Decimal,
    default_wager: Decimal,
    max_wager: Decimal,
    scheduler: Arc<dyn TickScheduler>,
    listener: Arc<dyn SettlementListener>,
    shared: Arc<Mutex<EngineState>>,
}

impl RoundEngine {
    /// An idle engine with an OS-seeded sampler and logging settlements.
    pub fn new(config: EngineConfig, scheduler: Arc<dyn TickScheduler>) -> Self {
        let state = EngineState {
            round: Round::idle(),
            history: CrashHistory::new(config.history_capacity),
            sampler: CrashPointSampler::from_entropy(),
            ticker: None,
        };
        Self {
            growth_factor: config.growth_decimal(),
            default_wager: config.default_wager_decimal(),
            max_wager: config.max_wager_decimal(),
            config,
            scheduler,
            listener: Arc::new(LogSettlements),
            shared: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_sampler(self, sampler: CrashPointSampler) -> Self {
        lock(&self.shared).sampler = sampler;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn SettlementListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Start a new round.
    ///
    /// A missing, non-positive or above-maximum wager falls back to the
    /// configured default. Fails with [`CrashError::RoundAlreadyActive`]
    /// while a round is running.
    pub fn start(&self, wager: Option<Decimal>) -> Result<RoundStarted, CrashError> {
        let wager = match wager {
            Some(w) if w > Decimal::ZERO && w <= self.max_wager => w,
            Some(w) => {
                debug!(requested = %w, default = %self.default_wager, "Wager out of range, using default");
                self.default_wager
            }
            None => self.default_wager,
        };

        let mut state = lock(&self.shared);
        if state.round.state().is_running() {
            debug!(round_id = %state.round.id(), "Start rejected: round already running");
            return Err(CrashError::RoundAlreadyActive);
        }

        state.cancel_ticker();
        let crash_point = state.sampler.draw();
        state.round = Round::running(wager, crash_point);
        let round_id = state.round.id();
        let task = self.tick_task(round_id);
        state.ticker = Some(self.scheduler.schedule(self.config.tick_interval(), task));

        info!(%round_id, %wager, "Round started");
        debug!(%round_id, %crash_point, "Crash point drawn");

        Ok(RoundStarted {
            round_id,
            wager,
            crash_point: self.disclose(&state.round),
        })
    }

    /// Cash out at the current multiplier.
    pub fn attempt_lock_in(&self) -> Result<LockIn, CrashError> {
        let mut state = lock(&self.shared);
        match state.round.lock_in() {
            Ok(lock_in) => {
                info!(
                    round_id = %state.round.id(),
                    multiplier = %lock_in.multiplier,
                    payout = %lock_in.payout,
                    "Locked in"
                );
                Ok(lock_in)
            }
            Err(e) => {
                debug!(error = %e, state = %state.round.state(), "Lock-in rejected");
                Err(e)
            }
        }
    }

    /// Current round as seen by callers. The crash point is withheld unless
    /// the disclosure policy allows it.
    pub fn snapshot(&self) -> RoundSnapshot {
        let state = lock(&self.shared);
        let round = &state.round;
        RoundSnapshot {
            game_state: round.state(),
            multiplier: round.multiplier(),
            crash_point: self.disclose(round),
            cashed_out: round.locked_in(),
            winnings: round.payout(),
            cashout_multiplier: round.lock_in_multiplier(),
            history: state.history.to_vec(),
            bet: round.wager(),
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared).round.state().is_running()
    }

    pub fn current_round_id(&self) -> Option<Uuid> {
        let state = lock(&self.shared);
        (!state.round.id().is_nil()).then(|| state.round.id())
    }

    /// Stop any tick loop and return to a fresh idle round with no history.
    pub fn reset(&self) {
        let mut state = lock(&self.shared);
        state.cancel_ticker();
        state.round = Round::idle();
        state.history.clear();
        info!("Engine reset");
    }

    fn disclose(&self, round: &Round) -> Option<Decimal> {
        match self.config.crash_point_disclosure {
            CrashPointDisclosure::Always => round.crash_point(),
            CrashPointDisclosure::OnSettle => match round.state() {
                RoundState::Settled => round.crash_point(),
                _ => None,
            },
        }
    }

    /// The per-round tick. Holds only a weak reference so a dropped engine
    /// ends its loop, and stops itself once `round_id` is no longer current.
    fn tick_task(&self, round_id: Uuid) -> TickTask {
        let shared = Arc::downgrade(&self.shared);
        let listener = Arc::clone(&self.listener);
        let growth_factor = self.growth_factor;

        Box::new(move || {
            let Some(shared) = shared.upgrade() else {
                return ControlFlow::Break(());
            };

            let outcome = {
                let mut state = lock(&shared);
                if state.round.id() != round_id {
                    return ControlFlow::Break(());
                }
                match state.round.advance(growth_factor) {
                    TickStep::Climbing(multiplier) => {
                        trace!(%round_id, %multiplier, "Tick");
                        return ControlFlow::Continue(());
                    }
                    TickStep::Stopped => return ControlFlow::Break(()),
                    TickStep::Crashed(outcome) => {
                        state.history.record(outcome.crash_point);
                        outcome
                    }
                }
            };

            info!(
                %round_id,
                crash_point = %outcome.crash_point,
                cashed_out = outcome.won(),
                payout = %outcome.payout,
                "Round crashed"
            );
            listener.round_settled(&outcome);
            ControlFlow::Break(())
        })
    }
}

impl std::fmt::Debug for RoundEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
