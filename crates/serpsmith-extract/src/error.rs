use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot reach {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("no parsable content structure at {url}")]
    Unparseable { url: String },

    #[error("fetch of {url} timed out")]
    Timeout { url: String },

    #[error("extraction cancelled")]
    Cancelled,
}
