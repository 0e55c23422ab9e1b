//! Deferred task scheduling for cache expiry

use parking_lot::Mutex;
use std::time::Duration;

use crate::error::CacheError;
use crate::Result;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs a task once after a delay.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: Task);
}

/// Scheduler backed by a tokio runtime timer.
#[derive(Clone)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

impl TokioScheduler {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is running on
    pub fn current() -> Result<Self> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| CacheError::NoRuntime(e.to_string()))
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}

struct ScheduledTask {
    due: Duration,
    id: u64,
    task: Task,
}

#[derive(Default)]
struct ManualClock {
    now: Duration,
    next_id: u64,
    tasks: Vec<ScheduledTask>,
}

/// Scheduler driven by an explicit virtual clock.
///
/// Nothing runs until `advance` is called; due tasks then fire in due-time
/// order (ties in scheduling order). Tasks scheduled by a firing task are
/// picked up by the same `advance` call when they fall inside the window.
#[derive(Default)]
pub struct ManualScheduler {
    clock: Mutex<ManualClock>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation
    pub fn now(&self) -> Duration {
        self.clock.lock().now
    }

    /// Number of tasks not yet fired
    pub fn pending(&self) -> usize {
        self.clock.lock().tasks.len()
    }

    /// Move the clock forward, firing every task that comes due.
    /// Returns the number of tasks fired.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut fired = 0;

        loop {
            let next = {
                let mut clock = self.clock.lock();
                let index = clock
                    .tasks
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.id))
                    .map(|(i, _)| i);

                match index {
                    Some(i) => {
                        let scheduled = clock.tasks.swap_remove(i);
                        clock.now = scheduled.due.max(clock.now);
                        Some(scheduled.task)
                    }
                    None => {
                        clock.now = target;
                        None
                    }
                }
            };

            // The clock lock is released before the task runs so it can reschedule
            match next {
                Some(task) => {
                    task();
                    fired += 1;
                }
                None => break,
            }
        }

        fired
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        let mut clock = self.clock.lock();
        let id = clock.next_id;
        clock.next_id += 1;
        let due = clock.now + delay;
        clock.tasks.push(ScheduledTask { due, id, task });
    }
}
