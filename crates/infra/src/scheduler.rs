//! Delayed-task execution on the tokio runtime.

use std::time::Duration;

use pdfrelay_conversion::{ScheduledTask, TaskScheduler};

/// Runs each scheduled task as its own tokio task after sleeping out the
/// delay. No queueing discipline beyond the runtime's own: tasks for
/// different jobs are independent, and per-job sequencing comes from the
/// dispatch chain only scheduling the next attempt once the previous one
/// resolved.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl TokioScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl TaskScheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: ScheduledTask) {
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            task.await;
        });
    }
}
