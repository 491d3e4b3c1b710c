//! In-memory account store for integration testing.
//!
//! Stands in for the external balance owner: it debits the wager when a
//! round is placed and applies each settled outcome, all in-memory.

use crash::engine::settlement::SettlementListener;
use crash::types::RoundOutcome;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockAccounts {
    balance: Arc<Mutex<Decimal>>,
    outcomes: Arc<Mutex<Vec<RoundOutcome>>>,
}

impl MockAccounts {
    pub fn new(balance: Decimal) -> Self {
        Self {
            balance: Arc::new(Mutex::new(balance)),
            outcomes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn balance(&self) -> Decimal {
        *self.balance.lock().unwrap()
    }

    pub fn outcomes(&self) -> Vec<RoundOutcome> {
        self.outcomes.lock().unwrap().clone()
    }
}

impl SettlementListener for MockAccounts {
    fn round_settled(&self, outcome: &RoundOutcome) {
        *self.balance.lock().unwrap() += outcome.balance_delta();
        self.outcomes.lock().unwrap().push(outcome.clone());
    }
}
