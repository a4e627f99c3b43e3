use std::sync::Arc;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use serpsmith_client::{ApiClient, ApiError, EndpointClass};

use crate::error::ExtractError;
use crate::parse::parse_page;
use crate::types::ExtractedPage;

/// Fetches competitor pages and parses them into structural records.
///
/// All fetches go through the shared [`ApiClient`] under the scrape endpoint
/// class, so page downloads are paced independently of SERP and NLP traffic.
pub struct Extractor {
    api: Arc<ApiClient>,
}

impl Extractor {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Fetches and parses a single page.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::Unreachable`] on network failure or non-2xx status.
    /// - [`ExtractError::Timeout`] on per-call timeout after all retries.
    /// - [`ExtractError::Unparseable`] when the page has no visible text.
    /// - [`ExtractError::Cancelled`] when `cancel` fired.
    pub async fn extract(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ExtractedPage, ExtractError> {
        let html = self
            .api
            .get_text(EndpointClass::Scrape, url, cancel)
            .await
            .map_err(|e| classify_fetch(e, url))?;
        parse_page(url, &html)
    }

    /// Fetches a batch of pages with bounded concurrency.
    ///
    /// Results align one-to-one with `urls` in order. A failed URL yields an
    /// `Err` in its slot and never affects its siblings; failures are logged
    /// and the batch continues.
    pub async fn extract_all(
        &self,
        urls: &[String],
        concurrency: usize,
        cancel: &CancellationToken,
    ) -> Vec<Result<ExtractedPage, ExtractError>> {
        futures::stream::iter(urls.iter().cloned())
            .map(|url| async move {
                let result = self.extract(&url, cancel).await;
                if let Err(error) = &result {
                    tracing::warn!(%url, %error, "page extraction failed, continuing batch");
                }
                result
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}

fn classify_fetch(err: ApiError, url: &str) -> ExtractError {
    match err {
        ApiError::Timeout { url } => ExtractError::Timeout { url },
        ApiError::Cancelled => ExtractError::Cancelled,
        other => ExtractError::Unreachable {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
#[path = "extractor_test.rs"]
mod tests;
