use async_trait::async_trait;
use log::debug;
use reqwest::{header, Client, ClientBuilder};
use thiserror::Error;

use super::{RenderSession, Renderer};
use crate::core::RenderOptions;
use crate::{ScraperError, ScraperResult};

#[derive(Debug, Error)]
pub enum HttpRendererError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] header::InvalidHeaderName),
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] header::InvalidHeaderValue),
}

impl From<HttpRendererError> for ScraperError {
    fn from(err: HttpRendererError) -> Self {
        ScraperError::RenderError(err.to_string())
    }
}

/// Fetches pages with a plain GET, for layouts rendered on the server.
///
/// No script runs, so the settle and scroll options are ignored. Every
/// session builds its own client and therefore its own connection pool.
#[derive(Clone)]
pub struct HttpRenderer {
    headers: header::HeaderMap,
}

impl HttpRenderer {
    pub fn new(options: &RenderOptions) -> Result<Self, HttpRendererError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(&options.user_agent)?,
        );
        Ok(Self { headers })
    }

    pub fn with_headers(mut self, headers: Vec<(&str, &str)>) -> Result<Self, HttpRendererError> {
        for (key, value) in headers {
            let name = header::HeaderName::from_bytes(key.as_bytes())?;
            let value = header::HeaderValue::from_str(value)?;
            self.headers.insert(name, value);
        }
        Ok(self)
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    fn name(&self) -> &str {
        "http"
    }

    async fn acquire(&self) -> ScraperResult<Box<dyn RenderSession>> {
        let client = ClientBuilder::new()
            .default_headers(self.headers.clone())
            .build()
            .map_err(HttpRendererError::from)?;
        Ok(Box::new(HttpSession { client }))
    }
}

struct HttpSession {
    client: Client,
}

#[async_trait]
impl RenderSession for HttpSession {
    async fn render(&mut self, url: &str) -> ScraperResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(HttpRendererError::from)?;

        let status = response.status();
        let body = response.text().await.map_err(HttpRendererError::from)?;
        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(body)
    }

    async fn shutdown(&mut self) -> ScraperResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (HttpRenderer, MockServer) {
        let server = MockServer::start().await;
        let renderer = HttpRenderer::new(&RenderOptions::default()).unwrap();
        (renderer, server)
    }

    #[tokio::test]
    async fn test_render_returns_body() {
        let (renderer, mock_server) = setup().await;

        Mock::given(method("GET"))
            .and(path("/profile/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><h3 class=\"startup-name\">Acme</h3></html>")
                    .insert_header("content-type", "text/html"),
            )
            .mount(&mock_server)
            .await;

        let mut session = renderer.acquire().await.unwrap();
        let body = session
            .render(&format!("{}/profile/1", mock_server.uri()))
            .await
            .unwrap();
        session.shutdown().await.unwrap();

        assert!(body.contains("Acme"));
    }

    #[tokio::test]
    async fn test_error_status_is_render_failure() {
        let (renderer, mock_server) = setup().await;

        Mock::given(method("GET"))
            .and(path("/profile/2"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&mock_server)
            .await;

        let mut session = renderer.acquire().await.unwrap();
        let result = session
            .render(&format!("{}/profile/2", mock_server.uri()))
            .await;

        assert!(matches!(result, Err(ScraperError::RenderError(_))));
    }

    #[tokio::test]
    async fn test_sends_configured_user_agent() {
        let options = RenderOptions {
            user_agent: "ProfileBot/1.0".to_string(),
            ..Default::default()
        };
        let renderer = HttpRenderer::new(&options).unwrap();
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header("user-agent", "ProfileBot/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let mut session = renderer.acquire().await.unwrap();
        let body = session.render(&mock_server.uri()).await.unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_custom_headers() {
        let (renderer, mock_server) = setup().await;
        let renderer = renderer
            .with_headers(vec![("accept-language", "en-IN")])
            .unwrap();

        Mock::given(method("GET"))
            .and(header("accept-language", "en-IN"))
            .respond_with(ResponseTemplate::new(200).set_body_string("namaste"))
            .mount(&mock_server)
            .await;

        let mut session = renderer.acquire().await.unwrap();
        assert_eq!(session.render(&mock_server.uri()).await.unwrap(), "namaste");
    }

    #[test]
    fn test_invalid_headers() {
        let renderer = HttpRenderer::new(&RenderOptions::default()).unwrap();
        let result = renderer.with_headers(vec![("invalid\0header", "value")]);
        assert!(result.is_err());
    }
}
