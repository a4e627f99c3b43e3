use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("SERP collection failed: {message}")]
    Collection { message: String },

    #[error("semantic analysis unavailable: NLP provider credentials are not configured")]
    AnalyzerUnconfigured,

    #[error("no competitor pages could be analyzed ({attempted} attempted)")]
    NoCoverage { attempted: usize },

    #[error("pipeline run cancelled")]
    Cancelled,
}
