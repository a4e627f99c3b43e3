use thiserror::Error;

use crate::pacer::EndpointClass;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited on {class} endpoint (retry after {retry_after_secs}s)")]
    RateLimited {
        class: EndpointClass,
        retry_after_secs: u64,
    },

    #[error("upstream returned HTTP {status} for {url}")]
    Upstream { status: u16, url: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed response from {context}: {reason}")]
    MalformedResponse { context: String, reason: String },

    #[error("no generative provider is configured")]
    NoProviderAvailable,

    #[error("call cancelled")]
    Cancelled,
}
