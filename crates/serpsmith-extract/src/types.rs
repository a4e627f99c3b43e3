use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One heading in document order. Nesting is given by `level` (1–6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// Normalized structural record for one fetched competitor page.
///
/// Immutable once produced; the extraction timestamp records when the page
/// was fetched, not when it was later read from cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedPage {
    pub source_url: String,
    /// Headings in document order.
    pub headings: Vec<Heading>,
    pub paragraph_count: usize,
    pub word_count: usize,
    pub extraction_timestamp: DateTime<Utc>,
}
