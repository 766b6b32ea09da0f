mod policy;
mod types;
mod utils;

pub use types::{AttemptFailure, BackoffPolicy, FailureKind, RetryConfig};
pub use utils::calculate_delay;
