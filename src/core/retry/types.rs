use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackoffPolicy {
    Constant,
    Linear,
    Exponential { factor: f32 },
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Render,     // navigation, timeout, session start, non-2xx
    Parse,      // markup unusable as a document
    Extraction, // extractor panicked
    Aborted,    // task died outside an attempt
}

/// One failed attempt of one profile task.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptFailure {
    pub attempt: usize,
    pub kind: FailureKind,
    pub reason: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_policy: BackoffPolicy,
}
