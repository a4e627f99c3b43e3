use thiserror::Error;

use serpsmith_client::ApiError;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("NLP provider credentials are not configured")]
    Unconfigured,

    #[error("NLP provider call failed: {0}")]
    UpstreamFailure(#[from] ApiError),

    #[error("unexpected NLP provider response for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
