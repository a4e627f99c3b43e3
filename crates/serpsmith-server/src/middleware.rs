//! Request middleware: request-id propagation, bearer auth, and per-client
//! rate limiting. Rejections use the same response envelope as the handlers,
//! so clients parse one error shape everywhere.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use crate::api::ApiError;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer-token auth settings.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<HashSet<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth config from `SERPSMITH_API_KEYS` (comma-separated bearer
    /// tokens).
    ///
    /// In development, empty/missing keys disable auth for local iteration.
    /// In non-development envs, empty/missing keys fail startup.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("SERPSMITH_API_KEYS").unwrap_or_default();
        let keys: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        if keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "SERPSMITH_API_KEYS not set; bearer auth disabled in development environment"
                );
                return Ok(Self::from_keys(HashSet::new()));
            }

            anyhow::bail!(
                "SERPSMITH_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }

        Ok(Self::from_keys(keys))
    }

    /// Auth enabled iff at least one key is present.
    #[must_use]
    pub fn from_keys(keys: HashSet<String>) -> Self {
        let enabled = !keys.is_empty();
        Self {
            api_keys: Arc::new(keys),
            enabled,
        }
    }

    fn accepts(&self, token: &str) -> bool {
        self.api_keys.contains(token)
    }
}

#[derive(Debug)]
struct ClientWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window request limiter with one window per client.
///
/// Clients are identified by their bearer token; requests without one share
/// an anonymous window. Pipeline runs are expensive, so one noisy client must
/// not starve the rest.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    clients: Arc<Mutex<HashMap<String, ClientWindow>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Records one request for `client`; over the limit, returns how long the
    /// client must wait for its window to reset.
    async fn try_acquire(&self, client: &str) -> Result<(), Duration> {
        let mut clients = self.clients.lock().await;
        let now = Instant::now();
        let window = clients.entry(client.to_owned()).or_insert(ClientWindow {
            started_at: now,
            count: 0,
        });

        if now.duration_since(window.started_at) >= self.window {
            window.started_at = now;
            window.count = 0;
        }

        if window.count >= self.max_requests {
            let elapsed = now.duration_since(window.started_at);
            return Err(self.window.saturating_sub(elapsed));
        }

        window.count += 1;
        Ok(())
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing bearer-token auth when enabled.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    match bearer_token_of(&req) {
        Some(token) if auth.accepts(token) => next.run(req).await,
        _ => ApiError::new(
            request_id_of(&req),
            "unauthorized",
            "missing or invalid bearer token",
        )
        .into_response(),
    }
}

/// Middleware enforcing the per-client request window.
///
/// Rejections carry a `Retry-After` header with the seconds until the
/// client's window resets.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let client = bearer_token_of(&req).unwrap_or("anonymous").to_owned();

    match rate_limit.try_acquire(&client).await {
        Ok(()) => next.run(req).await,
        Err(wait) => {
            let retry_after_secs = wait.as_secs().max(1);
            let mut res = ApiError::new(
                request_id_of(&req),
                "rate_limited",
                format!("rate limit exceeded, retry in {retry_after_secs}s"),
            )
            .into_response();
            if let Ok(val) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                res.headers_mut().insert(header::RETRY_AFTER, val);
            }
            res
        }
    }
}

fn bearer_token_of(req: &Request) -> Option<&str> {
    extract_bearer_token(req.headers().get(header::AUTHORIZATION))
}

fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn auth_state_disabled_without_keys() {
        let state = AuthState::from_keys(HashSet::new());
        assert!(!state.enabled);
    }

    #[test]
    fn auth_state_enabled_with_keys() {
        let state = AuthState::from_keys(HashSet::from(["key-1".to_owned()]));
        assert!(state.enabled);
        assert!(state.accepts("key-1"));
        assert!(!state.accepts("key-2"));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_windows_are_tracked_per_client() {
        let state = RateLimitState::new(2, Duration::from_secs(60));

        assert!(state.try_acquire("token-a").await.is_ok());
        assert!(state.try_acquire("token-a").await.is_ok());
        assert!(state.try_acquire("token-a").await.is_err());
        assert!(
            state.try_acquire("token-b").await.is_ok(),
            "another client's window must be unaffected"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_window_resets_once_elapsed() {
        let state = RateLimitState::new(1, Duration::from_secs(60));

        assert!(state.try_acquire("token-a").await.is_ok());
        let wait = state
            .try_acquire("token-a")
            .await
            .expect_err("second request in the window must be rejected");
        assert!(wait <= Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(state.try_acquire("token-a").await.is_ok());
    }
}
