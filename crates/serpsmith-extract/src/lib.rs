//! Competitor page extraction.
//!
//! Fetches pages through the shared API client (scrape endpoint class) and
//! parses them into normalized structural records: heading outline, paragraph
//! count, word count. Batch extraction isolates failures per URL so one
//! unreachable competitor never aborts its siblings.

pub mod error;
pub mod extractor;
pub mod parse;
pub mod types;

pub use error::ExtractError;
pub use extractor::Extractor;
pub use types::{ExtractedPage, Heading};
