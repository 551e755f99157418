//! Retry policy for rate-limited provider calls

use std::time::Duration;

use crate::defaults::{DEFAULT_RATE_LIMIT_RETRY_ATTEMPTS, DEFAULT_RATE_LIMIT_RETRY_DELAY_MS};

/// How often and how patiently a rate-limited call is retried.
///
/// `max_attempts` counts the first call, so the default of 2 means one retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RATE_LIMIT_RETRY_ATTEMPTS,
            backoff: Duration::from_millis(DEFAULT_RATE_LIMIT_RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Single attempt, never retry
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Whether another attempt is allowed after `attempt` (1-based) was rate-limited
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
