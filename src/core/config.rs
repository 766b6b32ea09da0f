use crate::core::retry::RetryConfig;
use crate::{ScraperError, ScraperResult};
use std::ops::RangeInclusive;
use std::time::Duration;
use url::Url;

pub const INDEX_PLACEHOLDER: &str = "{index}";

const DEFAULT_URL_TEMPLATE: &str =
    "https://www.startupindia.gov.in/startup-india-showcase#/profile/{index}";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Profile URL with an `{index}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> ScraperResult<Self> {
        let template = template.into();
        if !template.contains(INDEX_PLACEHOLDER) {
            return Err(ScraperError::ConfigError(format!(
                "URL template '{}' has no {} placeholder",
                template, INDEX_PLACEHOLDER
            )));
        }

        let template = Self(template);
        Url::parse(&template.url_for(0))?;
        Ok(template)
    }

    pub fn url_for(&self, index: u32) -> String {
        self.0.replace(INDEX_PLACEHOLDER, &index.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UrlTemplate {
    fn default() -> Self {
        Self(DEFAULT_URL_TEMPLATE.to_string())
    }
}

/// Browser-side knobs, read by the renderer implementations.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub headless: bool,
    pub user_agent: String,
    pub settle_wait: Duration,
    pub scroll_to_bottom: bool,
    pub scroll_settle_wait: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            settle_wait: Duration::from_secs(10),
            scroll_to_bottom: true,
            scroll_settle_wait: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub first_index: u32,
    pub last_index: u32,
    pub url_template: UrlTemplate,
    pub retry: RetryConfig,
    pub max_concurrency: usize,
    pub attempt_timeout: Option<Duration>,
    pub render: RenderOptions,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            first_index: 1,
            last_index: 219,
            url_template: UrlTemplate::default(),
            retry: RetryConfig::default(),
            max_concurrency: 8,
            attempt_timeout: None,
            render: RenderOptions::default(),
        }
    }
}

impl RunConfig {
    pub fn with_range(mut self, first_index: u32, last_index: u32) -> Self {
        self.first_index = first_index;
        self.last_index = last_index;
        self
    }

    pub fn with_url_template(mut self, template: UrlTemplate) -> Self {
        self.url_template = template;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    pub fn indices(&self) -> RangeInclusive<u32> {
        self.first_index..=self.last_index
    }

    pub fn validate(&self) -> ScraperResult<()> {
        if self.first_index > self.last_index {
            return Err(ScraperError::ConfigError(format!(
                "profile range [{}, {}] is empty",
                self.first_index, self.last_index
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(ScraperError::ConfigError(
                "max attempts per task must be at least 1".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(ScraperError::ConfigError(
                "concurrency limit must be at least 1".to_string(),
            ));
        }
        if self.attempt_timeout == Some(Duration::ZERO) {
            return Err(ScraperError::ConfigError(
                "attempt timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
