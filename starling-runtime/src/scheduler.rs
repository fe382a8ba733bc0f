//! One-shot delayed task scheduling.
//!
//! The manager only ever needs "run this closure once, after a fixed
//! delay" for retry backoff. The trait keeps the manager testable: the
//! test suite swaps in a scheduler that records tasks and fires them
//! manually instead of sleeping.

use std::time::Duration;

use tracing::debug;

/// A one-shot delayed task.
pub type ScheduledTask = Box<dyn FnOnce() + Send + 'static>;

/// Fire-and-forget delayed execution.
pub trait Scheduler: Send + Sync + 'static {
    /// Schedules `task` to run once after `delay`. The label is used
    /// only for logging.
    fn schedule_once(&self, label: &'static str, delay: Duration, task: ScheduledTask);
}

/// Production scheduler backed by a tokio runtime.
#[derive(Clone)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

impl TokioScheduler {
    /// Creates a scheduler that spawns onto the given runtime handle.
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Creates a scheduler for the current runtime.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_once(&self, label: &'static str, delay: Duration, task: ScheduledTask) {
        // Safe cast: delays never exceed u64::MAX milliseconds.
        #[allow(clippy::cast_possible_truncation)]
        let delay_ms = delay.as_millis() as u64;
        debug!(label, delay_ms, "scheduling one-shot task");
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_tokio_scheduler_runs_task_after_delay() {
        let scheduler = TokioScheduler::current();
        let fired = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&fired);
        scheduler.schedule_once(
            "test-task",
            Duration::from_millis(10),
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );

        assert!(!fired.load(Ordering::SeqCst));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(fired.load(Ordering::SeqCst));
    }
}
