use super::{RenderSession, Renderer};
use crate::{ScraperError, ScraperResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Clone, Debug)]
pub enum MockPage {
    Markup(String),
    Failure(String),
    Panic(String),
}

#[derive(Clone, Debug)]
pub struct MockResponse {
    pub page: MockPage,
    pub delay: Option<Duration>,
}

impl MockResponse {
    pub fn markup(markup: impl Into<String>) -> Self {
        Self {
            page: MockPage::Markup(markup.into()),
            delay: None,
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            page: MockPage::Failure(reason.into()),
            delay: None,
        }
    }

    pub fn panic(message: impl Into<String>) -> Self {
        Self {
            page: MockPage::Panic(message.into()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Default)]
struct MockState {
    scripts: RwLock<HashMap<String, Vec<MockResponse>>>,
    fallback: RwLock<Option<MockResponse>>,
    renders: RwLock<HashMap<String, usize>>,
    fail_acquire: AtomicBool,
    acquire_delay: RwLock<Option<Duration>>,
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

/// Scripted renderer for tests.
///
/// Each URL replays its scripted responses in order, repeating the last one
/// once the script runs out. Session acquisitions, releases and the peak
/// number of simultaneously open sessions are counted across clones.
#[derive(Clone, Default)]
pub struct MockRenderer {
    state: Arc<MockState>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(self, url: impl Into<String>, responses: Vec<MockResponse>) -> Self {
        self.state.scripts.write().insert(url.into(), responses);
        self
    }

    pub fn with_fallback(self, response: MockResponse) -> Self {
        *self.state.fallback.write() = Some(response);
        self
    }

    pub fn failing_acquire(self) -> Self {
        self.state.fail_acquire.store(true, Ordering::SeqCst);
        self
    }

    /// Makes every session take `delay` to start.
    pub fn with_acquire_delay(self, delay: Duration) -> Self {
        *self.state.acquire_delay.write() = Some(delay);
        self
    }

    pub fn render_count(&self, url: &str) -> usize {
        self.state.renders.read().get(url).copied().unwrap_or(0)
    }

    pub fn total_renders(&self) -> usize {
        self.state.renders.read().values().sum()
    }

    pub fn acquisitions(&self) -> usize {
        self.state.acquisitions.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.state.releases.load(Ordering::SeqCst)
    }

    pub fn peak_active(&self) -> usize {
        self.state.peak_active.load(Ordering::SeqCst)
    }

    fn next_response(&self, url: &str) -> Option<MockResponse> {
        let seen = {
            let mut renders = self.state.renders.write();
            let count = renders.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count - 1
        };

        match self.state.scripts.read().get(url) {
            Some(script) if !script.is_empty() => {
                Some(script[seen.min(script.len() - 1)].clone())
            }
            _ => self.state.fallback.read().clone(),
        }
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn acquire(&self) -> ScraperResult<Box<dyn RenderSession>> {
        if self.state.fail_acquire.load(Ordering::SeqCst) {
            return Err(ScraperError::RenderError(
                "mock session refused to start".to_string(),
            ));
        }

        let delay = *self.state.acquire_delay.read();
        if let Some(delay) = delay {
            sleep(delay).await;
        }

        self.state.acquisitions.fetch_add(1, Ordering::SeqCst);
        let active = self.state.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak_active.fetch_max(active, Ordering::SeqCst);

        Ok(Box::new(MockSession {
            renderer: self.clone(),
            open: true,
        }))
    }
}

struct MockSession {
    renderer: MockRenderer,
    open: bool,
}

#[async_trait]
impl RenderSession for MockSession {
    async fn render(&mut self, url: &str) -> ScraperResult<String> {
        let Some(response) = self.renderer.next_response(url) else {
            return Err(ScraperError::RenderError(format!(
                "no scripted response for {}",
                url
            )));
        };

        if let Some(delay) = response.delay {
            sleep(delay).await;
        }

        match response.page {
            MockPage::Markup(markup) => Ok(markup),
            MockPage::Failure(reason) => Err(ScraperError::RenderError(reason)),
            MockPage::Panic(message) => panic!("{}", message),
        }
    }

    async fn shutdown(&mut self) -> ScraperResult<()> {
        if self.open {
            self.open = false;
            let state = &self.renderer.state;
            state.active.fetch_sub(1, Ordering::SeqCst);
            state.releases.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
