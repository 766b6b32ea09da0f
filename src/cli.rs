use crate::core::retry::{BackoffPolicy, RetryConfig};
use crate::core::{RenderOptions, RunConfig, UrlTemplate};
use crate::renderers::webdriver::DEFAULT_WEBDRIVER_URL;
use crate::renderers::{HttpRenderer, Renderer, WebDriverRenderer};
use crate::{ScraperError, ScraperResult};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererKind {
    /// Chrome through a WebDriver server; runs the page's scripts
    Webdriver,
    /// Plain HTTP GET; for server-rendered pages
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backoff {
    Constant,
    Linear,
    Exponential,
}

#[derive(Debug, Parser)]
#[command(
    name = "profilescraper",
    version,
    about = "Scrape a range of profile pages into one JSON file"
)]
pub struct Args {
    /// First profile index
    #[arg(long, default_value_t = 1)]
    pub first: u32,

    /// Last profile index, inclusive
    #[arg(long, default_value_t = 219)]
    pub last: u32,

    /// Profile URL with an {index} placeholder
    #[arg(long)]
    pub url_template: Option<String>,

    #[arg(short, long, default_value = "startups.json")]
    pub output: PathBuf,

    /// Also write the skipped profiles and their failure reasons here
    #[arg(long)]
    pub failures_output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = RendererKind::Webdriver)]
    pub renderer: RendererKind,

    #[arg(long, default_value = DEFAULT_WEBDRIVER_URL)]
    pub webdriver_url: String,

    #[arg(long)]
    pub headed: bool,

    #[arg(long)]
    pub user_agent: Option<String>,

    #[arg(short = 'c', long, default_value_t = 8)]
    pub concurrency: usize,

    #[arg(long, default_value_t = 3)]
    pub max_attempts: usize,

    /// Seconds to wait between attempts
    #[arg(long, default_value_t = 5.0)]
    pub backoff_secs: f64,

    #[arg(long, value_enum, default_value_t = Backoff::Constant)]
    pub backoff: Backoff,

    /// Upper bound for a growing backoff; defaults to 60s or the backoff itself
    #[arg(long)]
    pub max_backoff_secs: Option<f64>,

    /// Seconds to let the page settle after navigation
    #[arg(long, default_value_t = 10.0)]
    pub settle_secs: f64,

    /// Seconds to let the page settle after scrolling to the bottom
    #[arg(long, default_value_t = 5.0)]
    pub scroll_settle_secs: f64,

    #[arg(long)]
    pub no_scroll: bool,

    /// Give up on an attempt whose session start and render take longer than this
    #[arg(long)]
    pub attempt_timeout_secs: Option<f64>,
}

fn seconds(value: f64, name: &str) -> ScraperResult<Duration> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        ScraperError::ConfigError(format!("{} must be a non-negative number", name))
    })
}

impl Args {
    pub fn run_config(&self) -> ScraperResult<RunConfig> {
        let url_template = match &self.url_template {
            Some(template) => UrlTemplate::new(template.as_str())?,
            None => UrlTemplate::default(),
        };

        let backoff_policy = match self.backoff {
            Backoff::Constant => BackoffPolicy::Constant,
            Backoff::Linear => BackoffPolicy::Linear,
            Backoff::Exponential => BackoffPolicy::Exponential { factor: 2.0 },
        };
        let mut retry = RetryConfig::default()
            .with_max_attempts(self.max_attempts)
            .with_delay(seconds(self.backoff_secs, "--backoff-secs")?)
            .with_policy(backoff_policy);
        if let Some(max_backoff) = self.max_backoff_secs {
            let max_delay = seconds(max_backoff, "--max-backoff-secs")?;
            if max_delay < retry.initial_delay {
                return Err(ScraperError::ConfigError(
                    "--max-backoff-secs must not be below --backoff-secs".to_string(),
                ));
            }
            retry = retry.with_max_delay(max_delay);
        }

        let defaults = RenderOptions::default();
        let render = RenderOptions {
            headless: !self.headed,
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            settle_wait: seconds(self.settle_secs, "--settle-secs")?,
            scroll_to_bottom: !self.no_scroll,
            scroll_settle_wait: seconds(self.scroll_settle_secs, "--scroll-settle-secs")?,
        };

        let attempt_timeout = self
            .attempt_timeout_secs
            .map(|secs| seconds(secs, "--attempt-timeout-secs"))
            .transpose()?;

        let config = RunConfig::default()
            .with_range(self.first, self.last)
            .with_url_template(url_template)
            .with_retry(retry)
            .with_concurrency(self.concurrency)
            .with_attempt_timeout(attempt_timeout)
            .with_render_options(render);
        config.validate()?;
        Ok(config)
    }

    pub fn renderer(&self, config: &RunConfig) -> ScraperResult<Box<dyn Renderer>> {
        Ok(match self.renderer {
            RendererKind::Webdriver => Box::new(WebDriverRenderer::new(
                self.webdriver_url.as_str(),
                config.render.clone(),
            )),
            RendererKind::Http => Box::new(HttpRenderer::new(&config.render)?),
        })
    }
}
