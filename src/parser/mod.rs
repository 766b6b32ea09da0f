pub mod document;
mod profile_parser;

pub use document::parse_document;
pub use profile_parser::{ProfileExtractor, ProfileLayout};
