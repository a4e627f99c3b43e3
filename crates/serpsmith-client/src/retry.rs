//! Exponential-backoff retry for transient upstream errors.
//!
//! Retriable: 429 responses, 5xx responses, network failures, and per-call
//! timeouts (each attempt counts against the same bounded cap). Non-retriable
//! errors (4xx other than 429, deserialization failures, cancellation) are
//! propagated immediately.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::ApiError;

/// Returns `true` if `err` represents a transient condition worth retrying
/// after a backoff delay.
fn is_retriable(err: &ApiError) -> bool {
    match err {
        ApiError::RateLimited { .. } | ApiError::Http(_) | ApiError::Timeout { .. } => true,
        ApiError::Upstream { status, .. } => *status >= 500,
        ApiError::Deserialize { .. }
        | ApiError::MalformedResponse { .. }
        | ApiError::NoProviderAvailable
        | ApiError::Cancelled => false,
    }
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// The wait before the n-th retry is `backoff_base_ms * 2^(n-1)` milliseconds;
/// with `max_retries = 3` the operation is attempted at most 4 times total.
/// Backoff sleeps race the cancellation token, so a cancelled run stops
/// waiting immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut last_err;
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                last_err = err;
            }
        }

        // Exponential backoff: base * 2^attempt milliseconds, overflow-capped.
        let delay_ms = backoff_base_ms.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms,
            error = %last_err,
            "transient upstream error, retrying after backoff"
        );
        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
            () = cancel.cancelled() => return Err(ApiError::Cancelled),
        }
        attempt += 1;
    }
}
