use crate::{ScraperError, ScraperResult};
use async_trait::async_trait;
use log::{debug, warn};
use tokio::runtime::Handle;

/// Source of fresh rendering sessions.
///
/// A session is stateful (a browser, a cookie jar) and may be left broken by
/// a failed navigation, so callers acquire a new one for every attempt and
/// never share it between tasks.
#[async_trait]
pub trait Renderer: Send + Sync {
    fn name(&self) -> &str;
    async fn acquire(&self) -> ScraperResult<Box<dyn RenderSession>>;
}

#[async_trait]
pub trait RenderSession: Send {
    /// Navigates to `url` and returns the settled document markup.
    async fn render(&mut self, url: &str) -> ScraperResult<String>;
    async fn shutdown(&mut self) -> ScraperResult<()>;
}

/// Owns one session for the length of one attempt.
///
/// Call [`SessionGuard::release`] on every normal exit. If the guard is
/// dropped while still holding its session (a panic, a cancelled future),
/// the shutdown is spawned onto the current runtime instead.
pub struct SessionGuard {
    session: Option<Box<dyn RenderSession>>,
}

impl SessionGuard {
    pub async fn acquire(renderer: &dyn Renderer) -> ScraperResult<Self> {
        let session = renderer.acquire().await?;
        debug!("Acquired {} session", renderer.name());
        Ok(Self {
            session: Some(session),
        })
    }

    pub async fn render(&mut self, url: &str) -> ScraperResult<String> {
        match self.session.as_mut() {
            Some(session) => session.render(url).await,
            None => Err(ScraperError::RenderError(
                "session already released".to_string(),
            )),
        }
    }

    pub async fn release(mut self) -> ScraperResult<()> {
        match self.session.take() {
            Some(mut session) => session.shutdown().await,
            None => Ok(()),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        match Handle::try_current() {
            Ok(handle) => {
                debug!("Session dropped without release, shutting down in background");
                handle.spawn(async move {
                    if let Err(e) = session.shutdown().await {
                        warn!("Background session shutdown failed: {}", e);
                    }
                });
            }
            Err(_) => warn!("Session dropped outside a runtime; it was not shut down"),
        }
    }
}
