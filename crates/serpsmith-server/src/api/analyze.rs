use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};

use serpsmith_analyze::{AnalyzeError, SemanticProfile};
use serpsmith_extract::{ExtractError, ExtractedPage};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub struct AnalyzeUrlRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeUrlData {
    pub page: ExtractedPage,
    pub profile: SemanticProfile,
}

/// `POST /api/v1/analyze-url`: extracts and profiles a single page without
/// running the full pipeline. Useful for inspecting one competitor.
pub async fn analyze_url(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<AnalyzeUrlRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let url = body.url.trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "url must be absolute (http or https)",
        ));
    }

    let cancel = state.shutdown.child_token();

    let page = state
        .extractor
        .extract(url, &cancel)
        .await
        .map_err(|e| map_extract_error(&req_id.0, &e))?;

    let profile = state
        .analyzer
        .analyze(&page, &cancel)
        .await
        .map_err(|e| map_analyze_error(&req_id.0, &e))?;

    Ok(Json(ApiResponse {
        data: AnalyzeUrlData { page, profile },
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn map_extract_error(req_id: &str, err: &ExtractError) -> ApiError {
    let code = match err {
        ExtractError::Unreachable { .. } | ExtractError::Timeout { .. } => "upstream_error",
        ExtractError::Unparseable { .. } => "unparseable",
        ExtractError::Cancelled => "cancelled",
    };
    ApiError::new(req_id, code, err.to_string())
}

fn map_analyze_error(req_id: &str, err: &AnalyzeError) -> ApiError {
    let code = match err {
        AnalyzeError::Unconfigured => "unconfigured",
        AnalyzeError::UpstreamFailure(_) => "upstream_error",
        AnalyzeError::Deserialize { .. } => "upstream_error",
    };
    ApiError::new(req_id, code, err.to_string())
}
