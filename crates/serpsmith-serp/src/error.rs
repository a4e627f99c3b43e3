use thiserror::Error;

use serpsmith_client::ApiError;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("invalid keyword: {0}")]
    InvalidInput(String),

    #[error("SERP provider failure: {0}")]
    UpstreamFailure(#[from] ApiError),

    #[error("unexpected SERP response shape for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
