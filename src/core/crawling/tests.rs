use super::{compact, Crawler, TaskExecutor};
use crate::core::retry::{FailureKind, RetryConfig};
use crate::core::{RunConfig, UrlTemplate};
use crate::parser::ProfileExtractor;
use crate::profile::ProfileRecord;
use crate::renderers::{MockRenderer, MockResponse};
use crate::storage::{MemoryStorage, StorageError};
use crate::ScraperError;
use std::sync::Arc;
use std::time::Duration;

const TEMPLATE: &str = "https://example.com/profile/{index}";

fn url(index: u32) -> String {
    format!("https://example.com/profile/{}", index)
}

fn page(company: &str) -> String {
    format!(
        r#"<html><head><title>{0} | Showcase</title></head>
        <body><h3 class="startup-name">{0}</h3></body></html>"#,
        company
    )
}

fn retry(max_attempts: usize) -> RetryConfig {
    RetryConfig::default()
        .with_max_attempts(max_attempts)
        .with_delay(Duration::ZERO)
}

fn config(first: u32, last: u32, max_attempts: usize, concurrency: usize) -> RunConfig {
    RunConfig::default()
        .with_range(first, last)
        .with_url_template(UrlTemplate::new(TEMPLATE).unwrap())
        .with_retry(retry(max_attempts))
        .with_concurrency(concurrency)
}

fn executor(renderer: &MockRenderer, retry: RetryConfig) -> TaskExecutor {
    TaskExecutor::new(
        Arc::new(renderer.clone()),
        Arc::new(ProfileExtractor::new().unwrap()),
        UrlTemplate::new(TEMPLATE).unwrap(),
        retry,
    )
}

fn company(record: &ProfileRecord) -> Option<&str> {
    record.company_name.as_deref()
}

#[tokio::test]
async fn test_record_carries_templated_url() {
    let renderer = MockRenderer::new().with_script(url(7), vec![MockResponse::markup(page("Acme"))]);

    let record = executor(&renderer, retry(3)).execute_task(7).await.unwrap();

    assert_eq!(record.source_url, url(7));
    assert_eq!(company(&record), Some("Acme"));
    assert_eq!(record.page_title(), Some("Acme | Showcase"));
    assert_eq!(renderer.render_count(&url(7)), 1);
}

#[tokio::test]
async fn test_retry_then_succeed() {
    let renderer = MockRenderer::new().with_script(
        url(1),
        vec![
            MockResponse::failure("net::ERR_CONNECTION_RESET"),
            MockResponse::failure("net::ERR_TIMED_OUT"),
            MockResponse::markup(page("Acme")),
        ],
    );

    let report = executor(&renderer, retry(3)).execute(1).await;

    assert_eq!(report.record.as_ref().and_then(company), Some("Acme"));
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].attempt, 1);
    assert_eq!(report.failures[1].attempt, 2);
    assert!(report.failures[1].reason.contains("ERR_TIMED_OUT"));
    assert_eq!(renderer.render_count(&url(1)), 3);
}

#[tokio::test]
async fn test_exhaustion_makes_exactly_max_attempts() {
    let renderer =
        MockRenderer::new().with_script(url(2), vec![MockResponse::failure("blocked")]);

    let report = executor(&renderer, retry(4)).execute(2).await;

    assert!(report.record.is_none());
    assert_eq!(report.failures.len(), 4);
    assert!(report
        .failures
        .iter()
        .all(|failure| failure.kind == FailureKind::Render));
    assert_eq!(renderer.render_count(&url(2)), 4);
}

#[tokio::test]
async fn test_fresh_session_per_attempt_and_always_released() {
    let renderer = MockRenderer::new()
        .with_script(
            url(1),
            vec![
                MockResponse::failure("crashed tab"),
                MockResponse::markup(page("Acme")),
            ],
        )
        .with_script(url(2), vec![MockResponse::failure("blocked")]);
    let executor = executor(&renderer, retry(3));

    assert!(executor.execute_task(1).await.is_some());
    assert!(executor.execute_task(2).await.is_none());

    assert_eq!(renderer.acquisitions(), 5);
    assert_eq!(renderer.releases(), 5);
    assert_eq!(renderer.peak_active(), 1);
}

#[tokio::test]
async fn test_session_start_failure_counts_as_attempt() {
    let renderer = MockRenderer::new()
        .with_fallback(MockResponse::markup(page("Acme")))
        .failing_acquire();

    let report = executor(&renderer, retry(2)).execute(1).await;

    assert!(report.record.is_none());
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].kind, FailureKind::Render);
    assert_eq!(renderer.total_renders(), 0);
}

#[tokio::test]
async fn test_empty_markup_is_retried_as_parse_failure() {
    let renderer = MockRenderer::new().with_script(
        url(1),
        vec![MockResponse::markup("   "), MockResponse::markup(page("Acme"))],
    );

    let report = executor(&renderer, retry(2)).execute(1).await;

    assert!(report.succeeded());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, FailureKind::Parse);
}

#[tokio::test(start_paused = true)]
async fn test_attempt_timeout_is_a_render_failure() {
    let renderer = MockRenderer::new().with_script(
        url(1),
        vec![
            MockResponse::markup(page("Slow")).with_delay(Duration::from_secs(60)),
            MockResponse::markup(page("Acme")),
        ],
    );
    let executor =
        executor(&renderer, retry(2)).with_attempt_timeout(Some(Duration::from_secs(5)));

    let report = executor.execute(1).await;

    assert_eq!(report.record.as_ref().and_then(company), Some("Acme"));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, FailureKind::Render);
    assert!(report.failures[0].reason.contains("timed out"));
    assert_eq!(renderer.releases(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_attempt_timeout_covers_session_start() {
    let renderer = MockRenderer::new()
        .with_fallback(MockResponse::markup(page("Acme")))
        .with_acquire_delay(Duration::from_secs(60));
    let executor =
        executor(&renderer, retry(2)).with_attempt_timeout(Some(Duration::from_secs(5)));

    let start = tokio::time::Instant::now();
    let report = executor.execute(1).await;

    assert!(report.record.is_none());
    assert_eq!(report.failures.len(), 2);
    assert!(report
        .failures
        .iter()
        .all(|failure| failure.reason.contains("timed out")));
    assert!(start.elapsed() < Duration::from_secs(60));
    assert_eq!(renderer.acquisitions(), 0);
    assert_eq!(renderer.total_renders(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_between_attempts() {
    let renderer = MockRenderer::new().with_script(url(1), vec![MockResponse::failure("down")]);
    let retry = RetryConfig::default()
        .with_max_attempts(3)
        .with_delay(Duration::from_secs(5));

    let start = tokio::time::Instant::now();
    let report = executor(&renderer, retry).execute(1).await;
    let elapsed = start.elapsed();

    // two waits: none after the final attempt
    assert!(report.record.is_none());
    assert!(elapsed >= Duration::from_secs(10));
    assert!(elapsed < Duration::from_secs(15));
}

#[tokio::test]
async fn test_fault_isolation_preserves_order() {
    let mut renderer = MockRenderer::new();
    for index in 1..=8 {
        let script = if index == 5 {
            vec![MockResponse::failure("always down")]
        } else {
            vec![MockResponse::markup(page(&format!("Company {}", index)))]
        };
        renderer = renderer.with_script(url(index), script);
    }
    let crawler = Crawler::new(Box::new(renderer.clone()), config(1, 8, 3, 3)).unwrap();

    let indices: Vec<u32> = (1..=8).collect();
    let results = crawler.run_all(&indices).await;

    assert_eq!(results.len(), 8);
    for (position, result) in results.iter().enumerate() {
        let index = position as u32 + 1;
        if index == 5 {
            assert!(result.is_none());
        } else {
            let record = result.as_ref().unwrap();
            assert_eq!(record.source_url, url(index));
            assert_eq!(company(record), Some(format!("Company {}", index).as_str()));
        }
    }
    assert_eq!(renderer.render_count(&url(5)), 3);
}

#[tokio::test(start_paused = true)]
async fn test_order_is_input_order_not_completion_order() {
    let renderer = MockRenderer::new()
        .with_script(
            url(1),
            vec![MockResponse::markup(page("Slow")).with_delay(Duration::from_secs(30))],
        )
        .with_script(url(2), vec![MockResponse::markup(page("Fast"))])
        .with_script(
            url(3),
            vec![MockResponse::markup(page("Medium")).with_delay(Duration::from_secs(5))],
        );
    let crawler = Crawler::new(Box::new(renderer), config(1, 3, 1, 3)).unwrap();

    let results = crawler.run_all(&[3, 1, 2]).await;
    let names: Vec<_> = results
        .iter()
        .map(|r| r.as_ref().and_then(company))
        .collect();

    assert_eq!(names, vec![Some("Medium"), Some("Slow"), Some("Fast")]);
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_limit_bounds_open_sessions() {
    let renderer = MockRenderer::new()
        .with_fallback(MockResponse::markup(page("Acme")).with_delay(Duration::from_millis(50)));
    let crawler = Crawler::new(Box::new(renderer.clone()), config(1, 20, 1, 3)).unwrap();

    let indices: Vec<u32> = (1..=20).collect();
    let results = crawler.run_all(&indices).await;

    assert_eq!(compact(results).len(), 20);
    assert_eq!(renderer.acquisitions(), 20);
    assert!(renderer.peak_active() <= 3);
    assert!(renderer.peak_active() >= 1);
}

#[tokio::test]
async fn test_render_panic_is_retried() {
    let renderer = MockRenderer::new().with_script(
        url(1),
        vec![
            MockResponse::panic("tab crashed"),
            MockResponse::markup(page("Acme")),
        ],
    );

    let report = executor(&renderer, retry(3)).execute(1).await;

    assert_eq!(report.record.as_ref().and_then(company), Some("Acme"));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].attempt, 1);
    assert_eq!(report.failures[0].kind, FailureKind::Render);
    assert!(report.failures[0].reason.contains("tab crashed"));
    assert_eq!(renderer.render_count(&url(1)), 2);

    // the panicked session is shut down in the background
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(renderer.releases(), renderer.acquisitions());
}

#[tokio::test]
async fn test_panicking_renderer_is_isolated() {
    let renderer = MockRenderer::new()
        .with_script(url(1), vec![MockResponse::markup(page("Acme"))])
        .with_script(url(2), vec![MockResponse::panic("renderer bug")])
        .with_script(url(3), vec![MockResponse::markup(page("Beta"))]);
    let crawler = Crawler::new(Box::new(renderer.clone()), config(1, 3, 2, 2)).unwrap();

    let reports = crawler.run_reports(&[1, 2, 3]).await;

    assert!(reports[0].succeeded());
    assert!(!reports[1].succeeded());
    assert_eq!(reports[1].failures.len(), 2);
    assert!(reports[1]
        .failures
        .iter()
        .all(|failure| failure.kind == FailureKind::Render));
    assert_eq!(renderer.render_count(&url(2)), 2);
    assert!(reports[2].succeeded());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(renderer.releases(), renderer.acquisitions());
}

#[tokio::test]
async fn test_end_to_end_run() {
    let renderer = MockRenderer::new()
        .with_script(url(1), vec![MockResponse::markup(page("Acme"))])
        .with_script(url(2), vec![MockResponse::failure("net::ERR_NAME_NOT_RESOLVED")])
        .with_script(
            url(3),
            vec![
                MockResponse::failure("white screen"),
                MockResponse::markup(page("Beta")),
            ],
        );
    let crawler = Crawler::new(Box::new(renderer.clone()), config(1, 3, 3, 2)).unwrap();
    let storage = MemoryStorage::new();

    let summary = crawler.run(&storage).await.unwrap();

    let records = storage.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].source_url, url(1));
    assert_eq!(company(&records[0]), Some("Acme"));
    assert_eq!(records[1].source_url, url(3));
    assert_eq!(company(&records[1]), Some("Beta"));

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].index, 2);
    assert_eq!(summary.skipped[0].url, url(2));
    assert_eq!(summary.skipped[0].failures.len(), 3);

    let stats = crawler.stats().get_stats();
    assert_eq!(stats.profiles_succeeded, 2);
    assert_eq!(stats.profiles_skipped, 1);
    assert_eq!(stats.total_attempts, 6);
    assert_eq!(stats.failed_attempts, 4);
    assert!(stats.end_time.is_some());
    assert_eq!(renderer.releases(), 6);
}

#[tokio::test]
async fn test_storage_failure_is_terminal() {
    let renderer = MockRenderer::new().with_fallback(MockResponse::markup(page("Acme")));
    let crawler = Crawler::new(Box::new(renderer), config(1, 2, 1, 2)).unwrap();

    let result = crawler.run(&MemoryStorage::failing("disk full")).await;

    assert!(matches!(
        result,
        Err(ScraperError::StorageError(StorageError::OperationError(_)))
    ));
}

#[test]
fn test_invalid_config_is_rejected() {
    let result = Crawler::new(Box::new(MockRenderer::new()), config(1, 3, 0, 2));
    assert!(matches!(result, Err(ScraperError::ConfigError(_))));
}

#[test]
fn test_compact_keeps_order() {
    let records = compact(vec![
        Some(ProfileRecord::new(url(1))),
        None,
        Some(ProfileRecord::new(url(3))),
        None,
    ]);

    assert_eq!(
        records.iter().map(|r| r.source_url.as_str()).collect::<Vec<_>>(),
        vec![url(1), url(3)]
    );
}
