//! Delayed-task executor seam.
//!
//! The pipeline never sleeps across attempts; it hands the next attempt to
//! a scheduler and returns. What actually runs the task after the delay is
//! an external concern (a tokio runtime in production, a hand-cranked fake
//! in tests).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// A unit of work to run after a delay.
pub type ScheduledTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Dispatches tasks to run after a scheduled delay.
///
/// Implementations must not block the caller; `schedule` only enqueues.
pub trait TaskScheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: ScheduledTask);
}

impl<T> TaskScheduler for Arc<T>
where
    T: TaskScheduler + ?Sized,
{
    fn schedule(&self, delay: Duration, task: ScheduledTask) {
        (**self).schedule(delay, task)
    }
}
