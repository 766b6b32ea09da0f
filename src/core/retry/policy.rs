use super::types::*;
use super::utils::calculate_delay;
use crate::ScraperError;
use chrono::Utc;
use std::fmt;
use std::time::Duration;

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            backoff_policy: BackoffPolicy::Constant,
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the first backoff, raising `max_delay` to it if needed.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self.max_delay = self.max_delay.max(delay);
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.backoff_policy = policy;
        self
    }

    /// Delay to sleep after the given failed attempt (1-based), or `None`
    /// when that attempt was the last one allowed.
    pub fn delay_after(&self, attempt: usize) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        Some(calculate_delay(self, attempt.saturating_sub(1)))
    }
}

impl AttemptFailure {
    pub fn new(attempt: usize, error: &ScraperError) -> Self {
        Self {
            attempt,
            kind: error.failure_kind(),
            reason: error.to_string(),
            at: Utc::now(),
        }
    }

    pub fn aborted(reason: impl Into<String>) -> Self {
        Self {
            attempt: 0,
            kind: FailureKind::Aborted,
            reason: reason.into(),
            at: Utc::now(),
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt {} ({:?}): {}", self.attempt, self.kind, self.reason)
    }
}
