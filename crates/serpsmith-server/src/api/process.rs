use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};

use serpsmith_pipeline::{KeywordRequest, PipelineError, PipelineOutcome};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

const MAX_DEPTH: usize = 10;

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub keyword: String,
    #[serde(default)]
    pub seed_url: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub depth: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ProcessData {
    #[serde(flatten)]
    pub outcome: PipelineOutcome,
    /// Present only when a generative provider produced a title; the
    /// deterministic `title_suggestion` inside the blueprint is unaffected.
    pub generated_title: Option<String>,
}

/// `POST /api/v1/process`: runs the full blueprint pipeline for one keyword.
pub async fn process(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ProcessRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.keyword.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "keyword must not be empty",
        ));
    }

    let mut request = KeywordRequest::new(&body.keyword);
    request.seed_url = body.seed_url;
    request.locale = body.locale;
    if let Some(depth) = body.depth {
        request.depth = depth.clamp(1, MAX_DEPTH);
    }

    let cancel = state.shutdown.child_token();
    let outcome = state
        .controller
        .run(&request, &cancel)
        .await
        .map_err(|e| map_pipeline_error(&req_id.0, &e))?;

    let generated_title = generate_title(&state, &outcome, &cancel).await;

    Ok(Json(ApiResponse {
        data: ProcessData {
            outcome,
            generated_title,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Asks the provider chain for a title refinement. Best-effort only: an empty
/// chain or a failed chain leaves the field null.
async fn generate_title(
    state: &AppState,
    outcome: &PipelineOutcome,
    cancel: &tokio_util::sync::CancellationToken,
) -> Option<String> {
    if state.generative.is_empty() {
        return None;
    }

    let headings: Vec<&str> = outcome
        .blueprint
        .sections
        .iter()
        .map(|s| s.heading.as_str())
        .collect();
    let prompt = format!(
        "Write a single compelling article title (no quotes, no preamble) for the \
         keyword \"{}\" covering these sections: {}.",
        outcome.blueprint.keyword,
        headings.join(", ")
    );

    match state.generative.generate(&prompt, cancel).await {
        Ok(title) => {
            let title = title.trim().to_owned();
            if title.is_empty() {
                None
            } else {
                Some(title)
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "title generation failed, keeping deterministic title");
            None
        }
    }
}

fn map_pipeline_error(req_id: &str, err: &PipelineError) -> ApiError {
    let code = match err {
        PipelineError::Collection { .. } => "upstream_error",
        PipelineError::AnalyzerUnconfigured => "unconfigured",
        PipelineError::NoCoverage { .. } => "no_coverage",
        PipelineError::Cancelled => "cancelled",
    };
    ApiError::new(req_id, code, err.to_string())
}
