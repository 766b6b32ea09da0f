pub mod cli;
pub mod core;
pub mod parser;
pub mod profile;
pub mod renderers;
pub mod stats;
pub mod storage;

pub use core::Crawler;
pub use core::{RunConfig, ScraperError, ScraperResult};
pub use parser::ProfileExtractor;
pub use profile::ProfileRecord;
pub use renderers::Renderer;
pub use stats::StatsTracker;
pub use storage::{DiskStorage, StorageBackend};
