mod config;
mod crawling;
mod errors;
pub mod retry;

pub use config::{RenderOptions, RunConfig, UrlTemplate, INDEX_PLACEHOLDER};
pub use crawling::{compact, Crawler, RunSummary, SkippedProfile, TaskExecutor, TaskReport};
pub(crate) use errors::panic_message;
pub use errors::{ScraperError, ScraperResult};
