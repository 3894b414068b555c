//! Retry policy shared by the blocking and async clients.

use crate::config::ClientConfig;
use crate::error::XhsError;
use std::time::Duration;

/// Linear backoff: retry `n` (1-based) waits `base_delay * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_delay,
        }
    }

    /// Total attempts allowed, first call included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }

    /// Decide whether attempt `attempt` (0-based) that failed with `err`
    /// gets another try, and how long to wait first.
    ///
    /// Rate-limit errors wait at least their advised `retry_after`.
    pub fn backoff(&self, err: &XhsError, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries || !err.is_retryable() {
            return None;
        }
        let delay = self.delay(attempt + 1);
        match err {
            XhsError::RateLimited { retry_after, .. } => Some(delay.max(*retry_after)),
            _ => Some(delay),
        }
    }
}
