//! Cancellable scheduled tasks.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};

/// An owned handle to a spawned timer or driver task.
///
/// Dropping the handle cancels the task. [`cancel`](Self::cancel) is
/// idempotent.
#[derive(Debug, Default)]
pub struct ScheduledTask {
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    /// Spawns `future` on the current runtime.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: Some(tokio::spawn(future)),
        }
    }

    /// A fixed-period ticker whose first tick fires one `period` from now.
    pub fn ticker(period: Duration) -> Interval {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }

    /// True while the task has been neither cancelled nor finished.
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Aborts the task if it is still held.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Lets the task run to completion without this handle.
    ///
    /// A task uses this on its own handle before its last awaits, so that
    /// releasing the handle does not abort it mid-way.
    pub fn detach(mut self) {
        self.handle.take();
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Cancels a task slot if occupied. Returns whether a task was cancelled.
pub(crate) fn cancel_slot(slot: &mut Option<ScheduledTask>) -> bool {
    match slot.take() {
        Some(mut task) => {
            let was_active = task.is_active();
            task.cancel();
            was_active
        }
        None => false,
    }
}
