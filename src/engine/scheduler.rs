//! Tick scheduling.
//!
//! The engine never sleeps itself: it hands a [`TickTask`] to a
//! [`TickScheduler`] and keeps the returned [`TickHandle`] so the loop can
//! be cancelled when the round is superseded or the engine is reset.
//!
//! - [`TokioScheduler`] runs the task on a tokio interval.
//! - [`ManualScheduler`] runs it only when [`ManualScheduler::fire`] is called.

use anyhow::{Context, Result};
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// One tick of work. `Break` unschedules the task.
pub type TickTask = Box<dyn FnMut() -> ControlFlow<()> + Send>;

pub trait TickScheduler: Send + Sync {
    /// Run `task` every `period`, first one period from now.
    fn schedule(&self, period: Duration, task: TickTask) -> Box<dyn TickHandle>;
}

/// Owner of a scheduled task. Dropping the handle cancels the task.
pub trait TickHandle: Send {
    fn cancel(&mut self);
    fn is_active(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Tokio
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    /// Bind to the runtime of the calling context.
    pub fn current() -> Result<Self> {
        let runtime = Handle::try_current().context("TokioScheduler needs a tokio runtime")?;
        Ok(Self { runtime })
    }
}

impl TickScheduler for TokioScheduler {
    fn schedule(&self, period: Duration, mut task: TickTask) -> Box<dyn TickHandle> {
        let first = Instant::now() + period;
        let join = self.runtime.spawn(async move {
            let mut ticks = interval_at(first, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                if task().is_break() {
                    break;
                }
            }
        });
        Box::new(TokioTickHandle { join })
    }
}

struct TokioTickHandle {
    join: JoinHandle<()>,
}

impl TickHandle for TokioTickHandle {
    fn cancel(&mut self) {
        if !self.join.is_finished() {
            debug!("Cancelling tick loop");
        }
        self.join.abort();
    }

    fn is_active(&self) -> bool {
        !self.join.is_finished()
    }
}

impl Drop for TokioTickHandle {
    fn drop(&mut self) {
        self.join.abort();
    }
}

// ---------------------------------------------------------------------------
// Manual
// ---------------------------------------------------------------------------

/// Scheduler whose ticks are driven by the caller.
///
/// Clones share the same task table, so a test can keep one clone and give
/// the other to the engine.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    table: Arc<Mutex<TaskTable>>,
}

#[derive(Default)]
struct TaskTable {
    next_id: u64,
    entries: Vec<TaskEntry>,
    fired: u64,
}

struct TaskEntry {
    id: u64,
    period: Duration,
    /// `None` while the task is running inside `fire`.
    task: Option<TickTask>,
    active: bool,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, TaskTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run every active task once. Returns the number still scheduled.
    pub fn fire(&self) -> usize {
        let ids: Vec<u64> = self
            .table()
            .entries
            .iter()
            .filter(|e| e.active)
            .map(|e| e.id)
            .collect();

        for id in ids {
            // The table lock is released while the task runs: tasks take the
            // engine lock, and the engine takes this one when it cancels.
            let task = self
                .table()
                .entries
                .iter_mut()
                .find(|e| e.id == id && e.active)
                .and_then(|e| e.task.take());
            let Some(mut task) = task else { continue };

            let flow = task();

            let mut table = self.table();
            table.fired += 1;
            if let Some(entry) = table.entries.iter_mut().find(|e| e.id == id) {
                if flow.is_break() {
                    entry.active = false;
                } else if entry.active {
                    entry.task = Some(task);
                }
            }
        }

        let mut table = self.table();
        table.entries.retain(|e| e.active);
        table.entries.len()
    }

    /// Fire up to `max` times, stopping early once nothing is scheduled.
    /// Returns the number of rounds of ticks fired.
    pub fn fire_until_idle(&self, max: usize) -> usize {
        let mut fired = 0;
        while fired < max && self.active_tasks() > 0 {
            self.fire();
            fired += 1;
        }
        fired
    }

    pub fn active_tasks(&self) -> usize {
        self.table().entries.iter().filter(|e| e.active).count()
    }

    /// Period of the most recently scheduled active task.
    pub fn period(&self) -> Option<Duration> {
        self.table()
            .entries
            .iter()
            .rev()
            .find(|e| e.active)
            .map(|e| e.period)
    }

    /// Total task invocations so far.
    pub fn fired(&self) -> u64 {
        self.table().fired
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule(&self, period: Duration, task: TickTask) -> Box<dyn TickHandle> {
        let mut table = self.table();
        let id = table.next_id;
        table.next_id += 1;
        table.entries.push(TaskEntry {
            id,
            period,
            task: Some(task),
            active: true,
        });
        Box::new(ManualTickHandle {
            id,
            table: Arc::clone(&self.table),
        })
    }
}

struct ManualTickHandle {
    id: u64,
    table: Arc<Mutex<TaskTable>>,
}

impl ManualTickHandle {
    fn with_entry<T>(&self, f: impl FnOnce(Option<&mut TaskEntry>) -> T) -> T {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        f(table.entries.iter_mut().find(|e| e.id == self.id))
    }
}

impl TickHandle for ManualTickHandle {
    fn cancel(&mut self) {
        let dropped = self.with_entry(|entry| {
            entry.and_then(|e| {
                e.active = false;
                e.task.take()
            })
        });
        // Dropped outside the table lock.
        drop(dropped);
    }

    fn is_active(&self) -> bool {
        self.with_entry(|entry| entry.map(|e| e.active).unwrap_or(false))
    }
}

impl Drop for ManualTickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
