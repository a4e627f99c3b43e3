use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;
use crate::sinks::{DeliverySink, SinkError};

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub content_type: String,
    pub format: String,
    pub content_data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub target: String,
    pub content_data: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct DeliveryData {
    pub sink: String,
    pub delivered: bool,
}

/// `POST /api/v1/export`: hands finished content to the export sink
/// (PDF/document formatting lives behind it).
pub async fn export(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ExportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = serde_json::json!({
        "content_type": body.content_type,
        "format": body.format,
        "content_data": body.content_data,
    });
    deliver(&state, Arc::clone(&state.export_sink), req_id, payload).await
}

/// `POST /api/v1/publish`: hands finished content to the publishing sink
/// (CMS connector).
pub async fn publish(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<PublishRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = serde_json::json!({
        "target": body.target,
        "content_data": body.content_data,
    });
    deliver(&state, Arc::clone(&state.publish_sink), req_id, payload).await
}

async fn deliver(
    state: &AppState,
    sink: Arc<dyn DeliverySink>,
    req_id: RequestId,
    payload: serde_json::Value,
) -> Result<Json<ApiResponse<DeliveryData>>, ApiError> {
    let cancel = state.shutdown.child_token();
    sink.deliver(&payload, &cancel)
        .await
        .map_err(|e| map_sink_error(&req_id.0, sink.name(), &e))?;

    Ok(Json(ApiResponse {
        data: DeliveryData {
            sink: sink.name().to_owned(),
            delivered: true,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn map_sink_error(req_id: &str, sink: &str, err: &SinkError) -> ApiError {
    match err {
        SinkError::Unconfigured => ApiError::new(
            req_id,
            "unconfigured",
            format!("{sink} sink is not configured"),
        ),
        SinkError::Delivery(message) => ApiError::new(req_id, "upstream_error", message.clone()),
    }
}
