use super::types::*;
use std::time::Duration;

/// Backoff for the `retry`-th retry (0-based), capped at `max_delay`.
pub fn calculate_delay(config: &RetryConfig, retry: usize) -> Duration {
    if retry == 0 {
        return std::cmp::min(config.initial_delay, config.max_delay);
    }

    let multiplier = match config.backoff_policy {
        BackoffPolicy::Constant => 1.0,
        BackoffPolicy::Linear => (retry + 1) as f64,
        BackoffPolicy::Exponential { factor } => {
            f64::from(factor).powi(i32::try_from(retry).unwrap_or(i32::MAX))
        }
    };

    // Duration arithmetic panics on overflow; clamp before converting.
    let nanos = (config.initial_delay.as_nanos() as f64 * multiplier).round();
    if !nanos.is_finite() || nanos >= config.max_delay.as_nanos() as f64 {
        return config.max_delay;
    }

    Duration::from_nanos(nanos.max(0.0) as u64)
}
