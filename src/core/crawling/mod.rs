mod crawler;
mod task;

pub use crawler::{compact, Crawler, RunSummary, SkippedProfile};
pub use task::{TaskExecutor, TaskReport};

#[cfg(test)]
mod tests;
