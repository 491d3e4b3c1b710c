//! Bounded record of recent crash points, most recent first.

use rust_decimal::Decimal;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct CrashHistory {
    points: VecDeque<Decimal>,
    capacity: usize,
}

impl CrashHistory {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a crash point to the front, evicting the oldest on overflow.
    pub fn record(&mut self, crash_point: Decimal) {
        self.points.push_front(crash_point);
        self.points.truncate(self.capacity);
    }

    pub fn to_vec(&self) -> Vec<Decimal> {
        self.points.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
