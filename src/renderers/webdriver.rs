use async_trait::async_trait;
use log::{debug, trace};
use thirtyfour::prelude::*;
use thirtyfour::{ChromeCapabilities, ChromiumLikeCapabilities};
use tokio::time::sleep;

use super::{RenderSession, Renderer};
use crate::core::RenderOptions;
use crate::{ScraperError, ScraperResult};

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

fn render_error(context: &str, error: WebDriverError) -> ScraperError {
    ScraperError::RenderError(format!("{}: {}", context, error))
}

/// Drives Chrome through a WebDriver server (chromedriver, Selenium).
///
/// Each acquired session is a new browser; the page is given a fixed settle
/// time after navigation, scrolled to the bottom to trigger lazy sections,
/// and given a second settle time before its source is read.
#[derive(Clone)]
pub struct WebDriverRenderer {
    server_url: String,
    options: RenderOptions,
}

impl WebDriverRenderer {
    pub fn new(server_url: impl Into<String>, options: RenderOptions) -> Self {
        Self {
            server_url: server_url.into(),
            options,
        }
    }

    fn capabilities(&self) -> WebDriverResult<ChromeCapabilities> {
        let mut caps = DesiredCapabilities::chrome();
        if self.options.headless {
            caps.add_arg("--headless=new")?;
        }
        caps.add_arg("--disable-blink-features=AutomationControlled")?;
        caps.add_arg(&format!("--user-agent={}", self.options.user_agent))?;
        Ok(caps)
    }
}

#[async_trait]
impl Renderer for WebDriverRenderer {
    fn name(&self) -> &str {
        "webdriver"
    }

    async fn acquire(&self) -> ScraperResult<Box<dyn RenderSession>> {
        let caps = self
            .capabilities()
            .map_err(|e| render_error("invalid browser capabilities", e))?;
        let driver = WebDriver::new(self.server_url.as_str(), caps)
            .await
            .map_err(|e| render_error("failed to start browser session", e))?;
        debug!("Started browser session on {}", self.server_url);

        Ok(Box::new(WebDriverSession {
            driver: Some(driver),
            options: self.options.clone(),
        }))
    }
}

struct WebDriverSession {
    driver: Option<WebDriver>,
    options: RenderOptions,
}

#[async_trait]
impl RenderSession for WebDriverSession {
    async fn render(&mut self, url: &str) -> ScraperResult<String> {
        let Some(driver) = self.driver.as_ref() else {
            return Err(ScraperError::RenderError(
                "browser session already closed".to_string(),
            ));
        };

        driver
            .goto(url)
            .await
            .map_err(|e| render_error("navigation failed", e))?;
        sleep(self.options.settle_wait).await;

        if self.options.scroll_to_bottom {
            driver
                .execute(SCROLL_TO_BOTTOM, Vec::new())
                .await
                .map_err(|e| render_error("scroll failed", e))?;
            sleep(self.options.scroll_settle_wait).await;
        }

        let source = driver
            .source()
            .await
            .map_err(|e| render_error("reading page source failed", e))?;
        trace!("Rendered {} ({} bytes)", url, source.len());
        Ok(source)
    }

    async fn shutdown(&mut self) -> ScraperResult<()> {
        match self.driver.take() {
            Some(driver) => driver
                .quit()
                .await
                .map_err(|e| render_error("closing browser failed", e)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_capabilities_include_headless_and_user_agent() {
        let renderer = WebDriverRenderer::new(
            DEFAULT_WEBDRIVER_URL,
            RenderOptions {
                user_agent: "ProfileBot/2.0".to_string(),
                ..Default::default()
            },
        );
        let caps = format!("{:?}", renderer.capabilities().unwrap());

        assert!(caps.contains("--headless=new"));
        assert!(caps.contains("--user-agent=ProfileBot/2.0"));
        assert!(caps.contains("AutomationControlled"));
    }

    #[test]
    fn test_headed_mode_omits_headless_flag() {
        let renderer = WebDriverRenderer::new(
            DEFAULT_WEBDRIVER_URL,
            RenderOptions {
                headless: false,
                ..Default::default()
            },
        );
        let caps = format!("{:?}", renderer.capabilities().unwrap());
        assert!(!caps.contains("--headless"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_render_failure() {
        let renderer = WebDriverRenderer::new(
            "http://127.0.0.1:9",
            RenderOptions {
                settle_wait: Duration::ZERO,
                ..Default::default()
            },
        );

        let result = renderer.acquire().await;
        assert!(matches!(result, Err(ScraperError::RenderError(_))));
    }
}
