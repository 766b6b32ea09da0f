use crate::core::config::UrlTemplate;
use crate::core::retry::{AttemptFailure, RetryConfig};
use crate::parser::ProfileExtractor;
use crate::profile::ProfileRecord;
use crate::renderers::{Renderer, SessionGuard};
use crate::stats::StatsTracker;
use crate::{ScraperError, ScraperResult};
use crate::core::panic_message;
use chrono::Utc;
use futures::FutureExt;
use log::{debug, info, warn};
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Outcome of one profile task: the record, if any attempt succeeded, and
/// every failed attempt that came before it.
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub index: u32,
    pub url: String,
    pub record: Option<ProfileRecord>,
    pub failures: Vec<AttemptFailure>,
}

impl TaskReport {
    pub fn succeeded(&self) -> bool {
        self.record.is_some()
    }
}

/// Runs one profile index through render, parse and extract, retrying with
/// a fresh renderer session per attempt.
pub struct TaskExecutor {
    renderer: Arc<dyn Renderer>,
    extractor: Arc<ProfileExtractor>,
    url_template: UrlTemplate,
    retry: RetryConfig,
    attempt_timeout: Option<Duration>,
    stats: Arc<StatsTracker>,
}

impl TaskExecutor {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        extractor: Arc<ProfileExtractor>,
        url_template: UrlTemplate,
        retry: RetryConfig,
    ) -> Self {
        Self {
            renderer,
            extractor,
            url_template,
            retry,
            attempt_timeout: None,
            stats: Arc::new(StatsTracker::new()),
        }
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Option<Duration>) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    pub fn with_stats(mut self, stats: Arc<StatsTracker>) -> Self {
        self.stats = stats;
        self
    }

    pub fn profile_url(&self, index: u32) -> String {
        self.url_template.url_for(index)
    }

    pub async fn execute_task(&self, index: u32) -> Option<ProfileRecord> {
        self.execute(index).await.record
    }

    pub async fn execute(&self, index: u32) -> TaskReport {
        let url = self.profile_url(index);
        let max_attempts = self.retry.max_attempts;
        let mut failures = Vec::new();

        for attempt in 1..=max_attempts {
            debug!("Profile {} attempt {}/{}: {}", index, attempt, max_attempts, url);
            let started = Utc::now();
            // A panicking renderer leaves its session to the guard's drop and
            // the attempt counts as a render failure.
            let result = match AssertUnwindSafe(self.attempt(&url)).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(ScraperError::RenderError(panic_message(
                    self.renderer.name(),
                    payload.as_ref(),
                ))),
            };
            let elapsed = Utc::now().signed_duration_since(started);

            match result {
                Ok(record) => {
                    self.stats.record_attempt(elapsed, None);
                    info!(
                        "Profile {} extracted on attempt {}/{}",
                        index, attempt, max_attempts
                    );
                    return TaskReport {
                        index,
                        url,
                        record: Some(record),
                        failures,
                    };
                }
                Err(error) => {
                    let failure = AttemptFailure::new(attempt, &error);
                    self.stats.record_attempt(elapsed, Some(failure.kind));
                    warn!(
                        "Attempt {}/{} failed for profile {}: {}",
                        attempt, max_attempts, index, error
                    );
                    failures.push(failure);

                    if let Some(delay) = self.retry.delay_after(attempt) {
                        debug!("Retrying profile {} in {:?}", index, delay);
                        sleep(delay).await;
                    }
                }
            }
        }

        warn!(
            "Giving up on profile {} after {} attempts: {}",
            index,
            max_attempts,
            failures
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        );
        TaskReport {
            index,
            url,
            record: None,
            failures,
        }
    }

    async fn attempt(&self, url: &str) -> ScraperResult<ProfileRecord> {
        let mut session = None;

        // The timeout covers session start-up as well as the render.
        let rendered = match self.attempt_timeout {
            Some(limit) => match timeout(limit, self.open_and_render(&mut session, url)).await {
                Ok(rendered) => rendered,
                Err(_) => Err(ScraperError::Timeout(limit)),
            },
            None => self.open_and_render(&mut session, url).await,
        };

        let outcome = rendered.and_then(|markup| self.extractor.extract_markup(url, &markup));

        if let Some(session) = session {
            if let Err(e) = session.release().await {
                warn!("Failed to release {} session: {}", self.renderer.name(), e);
            }
        }
        outcome
    }

    async fn open_and_render(
        &self,
        session: &mut Option<SessionGuard>,
        url: &str,
    ) -> ScraperResult<String> {
        let guard = SessionGuard::acquire(self.renderer.as_ref()).await?;
        session.insert(guard).render(url).await
    }
}
