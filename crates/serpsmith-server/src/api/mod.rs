mod analyze;
mod delivery;
mod process;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use serpsmith_client::ProviderChain;
use serpsmith_pipeline::{Controller, PageExtractor, SemanticAnalyzer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};
use crate::sinks::DeliverySink;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Controller>,
    pub extractor: Arc<dyn PageExtractor>,
    pub analyzer: Arc<dyn SemanticAnalyzer>,
    /// Empty chain when no generative provider is configured.
    pub generative: ProviderChain,
    pub export_sink: Arc<dyn DeliverySink>,
    pub publish_sink: Arc<dyn DeliverySink>,
    pub providers: ProviderHealth,
    /// Root token cancelled on shutdown; each request runs under a child.
    pub shutdown: CancellationToken,
}

/// Which external collaborators are configured, determined once at startup.
#[derive(Debug, Clone, Copy)]
pub struct ProviderHealth {
    pub serp: bool,
    pub nlp: bool,
    pub generative: bool,
    pub export_sink: bool,
    pub publish_sink: bool,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "unparseable" => StatusCode::UNPROCESSABLE_ENTITY,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" | "no_coverage" => StatusCode::BAD_GATEWAY,
            "unconfigured" | "cancelled" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    providers: ProviderStatusBody,
}

#[derive(Debug, Serialize)]
struct ProviderStatusBody {
    serp: &'static str,
    nlp: &'static str,
    generative: &'static str,
    export_sink: &'static str,
    publish_sink: &'static str,
}

fn configured(flag: bool) -> &'static str {
    if flag {
        "configured"
    } else {
        "unconfigured"
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/process", post(process::process))
        .route("/api/v1/analyze-url", post(analyze::analyze_url))
        .route("/api/v1/export", post(delivery::export))
        .route("/api/v1/publish", post(delivery::publish))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let p = state.providers;
    (
        StatusCode::OK,
        Json(ApiResponse {
            data: HealthData {
                status: "ok",
                providers: ProviderStatusBody {
                    serp: configured(p.serp),
                    nlp: configured(p.nlp),
                    generative: configured(p.generative),
                    export_sink: configured(p.export_sink),
                    publish_sink: configured(p.publish_sink),
                },
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}
