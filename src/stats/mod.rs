use crate::core::retry::FailureKind;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct ScrapingStats {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub profiles_succeeded: usize,
    pub profiles_skipped: usize,
    pub total_attempts: usize,
    pub failed_attempts: usize,
    pub failure_kinds: HashMap<FailureKind, usize>,
    pub average_attempt_time: f64, // in milliseconds
}

#[derive(Debug, Clone)]
pub struct StatsTracker {
    stats: Arc<RwLock<ScrapingStats>>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(ScrapingStats {
                start_time: Utc::now(),
                end_time: None,
                profiles_succeeded: 0,
                profiles_skipped: 0,
                total_attempts: 0,
                failed_attempts: 0,
                failure_kinds: HashMap::new(),
                average_attempt_time: 0.0,
            })),
        }
    }

    pub fn record_attempt(&self, duration: Duration, failure: Option<FailureKind>) {
        let mut stats = self.stats.write();
        stats.total_attempts += 1;

        if let Some(kind) = failure {
            stats.failed_attempts += 1;
            *stats.failure_kinds.entry(kind).or_insert(0) += 1;
        }

        let current_total = stats.average_attempt_time * (stats.total_attempts - 1) as f64;
        let new_duration = duration.num_milliseconds() as f64;
        stats.average_attempt_time = (current_total + new_duration) / stats.total_attempts as f64;
    }

    pub fn record_profile(&self, succeeded: bool) {
        let mut stats = self.stats.write();
        if succeeded {
            stats.profiles_succeeded += 1;
        } else {
            stats.profiles_skipped += 1;
        }
    }

    pub fn finish(&self) {
        self.stats.write().end_time = Some(Utc::now());
    }

    pub fn get_stats(&self) -> ScrapingStats {
        self.stats.read().clone()
    }

    pub fn print_summary(&self) {
        let stats = self.stats.read();
        let duration = stats
            .end_time
            .unwrap_or_else(Utc::now)
            .signed_duration_since(stats.start_time);

        println!("\nScraping Statistics:");
        println!("===================");
        println!("Duration: {} seconds", duration.num_seconds());
        println!("Profiles Extracted: {}", stats.profiles_succeeded);
        println!("Profiles Skipped: {}", stats.profiles_skipped);
        println!("Attempts: {}", stats.total_attempts);
        println!("Failed Attempts: {}", stats.failed_attempts);
        println!(
            "Average Attempt Time: {:.2}ms",
            stats.average_attempt_time
        );

        if !stats.failure_kinds.is_empty() {
            println!("\nFailure Reasons:");
            for (kind, count) in &stats.failure_kinds {
                println!("  {:?}: {}", kind, count);
            }
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}
