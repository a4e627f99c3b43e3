use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;

use serpsmith_core::RateIntervals;

use crate::error::ApiError;
use crate::pacer::{EndpointClass, Pacer};
use crate::retry::retry_with_backoff;

/// Shared outbound HTTP client.
///
/// One instance is constructed at startup and passed by reference to every
/// component that performs external calls. Each dispatch acquires a pacing
/// slot for its endpoint class first, so callers serialize against provider
/// rate limits regardless of how many workers are running.
///
/// Transient errors (429, 5xx, network failures, per-call timeouts) are
/// retried with exponential backoff up to `max_retries` additional attempts;
/// each retry re-acquires a pacing slot.
pub struct ApiClient {
    client: Client,
    pacer: Pacer,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl ApiClient {
    /// Creates an `ApiClient` with configured pacing, timeout, `User-Agent`,
    /// and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed (e.g., invalid TLS config).
    pub fn new(
        intervals: &RateIntervals,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            pacer: Pacer::new(intervals),
            max_retries,
            backoff_base_ms,
        })
    }

    /// Sends a paced GET request and parses the response body as JSON.
    ///
    /// # Errors
    ///
    /// - [`ApiError::RateLimited`] on HTTP 429 after all retries exhausted.
    /// - [`ApiError::Upstream`] on non-2xx status (5xx retried, 4xx not).
    /// - [`ApiError::Timeout`] on per-call timeout after all retries exhausted.
    /// - [`ApiError::Http`] on network or TLS failure after all retries.
    /// - [`ApiError::Deserialize`] when the body is not valid JSON (not retried).
    /// - [`ApiError::Cancelled`] when `cancel` fired while waiting or in flight.
    pub async fn get_json(
        &self,
        class: EndpointClass,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, ApiError> {
        let body = self
            .request_text(class, url, None, None, cancel)
            .await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Deserialize {
            context: url.to_owned(),
            source: e,
        })
    }

    /// Sends a paced GET request and returns the raw response body.
    ///
    /// Used by the content extractor, which parses HTML itself.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::get_json`], minus `Deserialize`.
    pub async fn get_text(
        &self,
        class: EndpointClass,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        self.request_text(class, url, None, None, cancel).await
    }

    /// Sends a paced POST request with a JSON body and optional bearer token,
    /// and parses the response body as JSON.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::get_json`].
    pub async fn post_json(
        &self,
        class: EndpointClass,
        url: &str,
        bearer: Option<&str>,
        payload: &serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, ApiError> {
        let body = self
            .request_text(class, url, Some(payload), bearer, cancel)
            .await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Deserialize {
            context: url.to_owned(),
            source: e,
        })
    }

    async fn request_text(
        &self,
        class: EndpointClass,
        url: &str,
        payload: Option<&serde_json::Value>,
        bearer: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, cancel, || {
            let url = url.to_owned();
            async move {
                self.pacer.acquire(class, cancel).await?;

                let mut request = match payload {
                    Some(body) => self.client.post(&url).json(body),
                    None => self.client.get(&url),
                };
                if let Some(token) = bearer {
                    request = request.bearer_auth(token);
                }

                let response = tokio::select! {
                    result = request.send() => result.map_err(|e| classify_transport(e, &url))?,
                    () = cancel.cancelled() => return Err(ApiError::Cancelled),
                };

                let status = response.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(ApiError::RateLimited {
                        class,
                        retry_after_secs,
                    });
                }

                if !status.is_success() {
                    return Err(ApiError::Upstream {
                        status: status.as_u16(),
                        url,
                    });
                }

                response
                    .text()
                    .await
                    .map_err(|e| classify_transport(e, &url))
            }
        })
        .await
    }
}

/// Maps a reqwest transport error to the taxonomy, keeping timeouts distinct
/// from other network failures so callers can report them precisely.
fn classify_transport(err: reqwest::Error, url: &str) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout {
            url: url.to_owned(),
        }
    } else {
        ApiError::Http(err)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
