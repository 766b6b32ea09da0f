use super::task::{TaskExecutor, TaskReport};
use crate::core::config::RunConfig;
use crate::core::retry::AttemptFailure;
use crate::parser::ProfileExtractor;
use crate::profile::ProfileRecord;
use crate::renderers::Renderer;
use crate::stats::StatsTracker;
use crate::storage::StorageBackend;
use crate::ScraperResult;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::spawn;

/// A profile that produced no record, with the reasons why.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedProfile {
    pub index: u32,
    pub url: String,
    pub failures: Vec<AttemptFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub skipped: Vec<SkippedProfile>,
}

/// Drops absent results, keeping the order of the present ones.
pub fn compact(results: Vec<Option<ProfileRecord>>) -> Vec<ProfileRecord> {
    results.into_iter().flatten().collect()
}

pub struct Crawler {
    executor: Arc<TaskExecutor>,
    config: RunConfig,
    stats: Arc<StatsTracker>,
}

impl Crawler {
    pub fn new(renderer: Box<dyn Renderer>, config: RunConfig) -> ScraperResult<Self> {
        Self::with_extractor(renderer, ProfileExtractor::new()?, config)
    }

    pub fn with_extractor(
        renderer: Box<dyn Renderer>,
        extractor: ProfileExtractor,
        config: RunConfig,
    ) -> ScraperResult<Self> {
        config.validate()?;
        info!(
            "Initializing crawler: renderer={}, profiles {}..={}, concurrency={}, attempts={}",
            renderer.name(),
            config.first_index,
            config.last_index,
            config.max_concurrency,
            config.retry.max_attempts
        );

        let stats = Arc::new(StatsTracker::new());
        let executor = TaskExecutor::new(
            Arc::from(renderer),
            Arc::new(extractor),
            config.url_template.clone(),
            config.retry.clone(),
        )
        .with_attempt_timeout(config.attempt_timeout)
        .with_stats(Arc::clone(&stats));

        Ok(Self {
            executor: Arc::new(executor),
            config,
            stats,
        })
    }

    pub fn executor(&self) -> &TaskExecutor {
        &self.executor
    }

    pub fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    /// Records for `indices`, in the same order, `None` where a task gave up.
    pub async fn run_all(&self, indices: &[u32]) -> Vec<Option<ProfileRecord>> {
        self.run_reports(indices)
            .await
            .into_iter()
            .map(|report| report.record)
            .collect()
    }

    /// Runs every index as its own task with at most `max_concurrency` in
    /// flight. Each finished task writes into its own slot, so the result
    /// order is the input order whatever the completion order.
    pub async fn run_reports(&self, indices: &[u32]) -> Vec<TaskReport> {
        let mut slots: Vec<Option<TaskReport>> = vec![None; indices.len()];
        let mut futures = FuturesUnordered::new();
        let limit = self.config.max_concurrency.max(1);

        for (slot, &index) in indices.iter().enumerate() {
            if futures.len() >= limit {
                debug!("Reached concurrency limit {}, waiting for slot", limit);
                if let Some((done, report)) = futures.next().await {
                    slots[done] = Some(report);
                }
            }

            let executor = Arc::clone(&self.executor);
            let handle = spawn(async move { executor.execute(index).await });
            let url = self.executor.profile_url(index);

            futures.push(async move {
                let report = match handle.await {
                    Ok(report) => report,
                    Err(e) => {
                        error!("Task for profile {} died: {}", index, e);
                        TaskReport {
                            index,
                            url,
                            record: None,
                            failures: vec![AttemptFailure::aborted(e.to_string())],
                        }
                    }
                };
                (slot, report)
            });
        }

        while let Some((done, report)) = futures.next().await {
            slots[done] = Some(report);
        }

        slots
            .into_iter()
            .zip(indices)
            .map(|(report, &index)| {
                report.unwrap_or_else(|| TaskReport {
                    index,
                    url: self.executor.profile_url(index),
                    record: None,
                    failures: vec![AttemptFailure::aborted("task result was lost")],
                })
            })
            .collect()
    }

    /// Crawls the configured range and persists the records that came back.
    ///
    /// Skipped profiles are part of a normal run; only a storage failure is
    /// returned as an error.
    pub async fn run<S: StorageBackend + ?Sized>(&self, storage: &S) -> ScraperResult<RunSummary> {
        let indices: Vec<u32> = self.config.indices().collect();
        info!("Starting crawl of {} profiles", indices.len());

        let reports = self.run_reports(&indices).await;

        let mut skipped = Vec::new();
        let mut results = Vec::with_capacity(reports.len());
        for report in reports {
            let TaskReport {
                index,
                url,
                record,
                failures,
            } = report;

            self.stats.record_profile(record.is_some());
            if record.is_none() {
                skipped.push(SkippedProfile {
                    index,
                    url,
                    failures,
                });
            }
            results.push(record);
        }

        let records = compact(results);
        self.stats.finish();
        info!(
            "Crawl completed: {} profiles extracted, {} skipped",
            records.len(),
            skipped.len()
        );
        if !skipped.is_empty() {
            warn!(
                "Skipped profiles: {:?}",
                skipped.iter().map(|s| s.index).collect::<Vec<_>>()
            );
        }

        storage.persist(&records).await?;

        Ok(RunSummary {
            succeeded: records.len(),
            skipped,
        })
    }
}
