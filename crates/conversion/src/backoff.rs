//! Retry backoff policy.

use std::time::Duration;

/// Delay before retry N+1, indexed by the number of failed attempts already
/// made. The schedule saturates at its last entry, so the maximum attempt
/// count can be raised without touching it.
pub const RETRY_DELAYS: [Duration; 9] = [
    Duration::from_secs(30),
    Duration::from_secs(60),
    Duration::from_secs(120),
    Duration::from_secs(300),
    Duration::from_secs(600),
    Duration::from_secs(1800),
    Duration::from_secs(3600),
    Duration::from_secs(3600),
    Duration::from_secs(7200),
];

/// Total number of tries (1 initial + 19 retries). Deliberately decoupled
/// from the schedule length.
pub const MAX_TRIES: u32 = 20;

/// Maps attempt counts to retry delays.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    max_tries: u32,
    /// Fixed 1s delays for dev/test cycles; never enabled in production.
    debug_fast: bool,
}

impl BackoffPolicy {
    pub fn new(debug_fast: bool) -> Self {
        Self {
            max_tries: MAX_TRIES,
            debug_fast,
        }
    }

    pub fn max_tries(&self) -> u32 {
        self.max_tries
    }

    /// Delay before the next try, given `attempt` failed attempts so far.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.debug_fast {
            return Duration::from_secs(1);
        }
        let idx = (attempt as usize).min(RETRY_DELAYS.len() - 1);
        RETRY_DELAYS[idx]
    }

    /// Whether `attempt` failed attempts exhaust the budget.
    pub fn exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_tries
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(false)
    }
}
