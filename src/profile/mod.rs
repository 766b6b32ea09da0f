mod record;

pub use record::{ProfileRecord, Role, PAGE_TITLE_KEY};
