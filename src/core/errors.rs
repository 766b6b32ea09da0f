use crate::core::retry::FailureKind;
use crate::storage::base::StorageError;
use std::any::Any;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Render timed out after {0:?}")]
    Timeout(Duration),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Extraction error: {0}")]
    ExtractionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl ScraperError {
    /// Classifies an error raised inside one attempt.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ScraperError::RenderError(_) | ScraperError::Timeout(_) | ScraperError::UrlError(_) => {
                FailureKind::Render
            }
            ScraperError::ParsingError(_) => FailureKind::Parse,
            ScraperError::ExtractionError(_) => FailureKind::Extraction,
            _ => FailureKind::Aborted,
        }
    }
}

pub type ScraperResult<T> = Result<T, ScraperError>;

/// Describes a caught panic payload, e.g. "webdriver panicked: tab crashed".
pub(crate) fn panic_message(context: &str, payload: &(dyn Any + Send)) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .map(|m| m.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());
    match message {
        Some(message) => format!("{} panicked: {}", context, message),
        None => format!("{} panicked", context),
    }
}
