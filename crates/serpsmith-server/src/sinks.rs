//! Export and publish delivery sinks.
//!
//! Finished content is handed to external collaborators (PDF formatters, CMS
//! connectors) over HTTP. Only the handoff result matters here; the sink's
//! internals are out of scope.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink is not configured")]
    Unconfigured,

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// A target that accepts finished content and reports success or failure.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    fn name(&self) -> &str;

    fn is_configured(&self) -> bool;

    async fn deliver(
        &self,
        payload: &serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<(), SinkError>;
}

/// Posts payloads to a configured HTTP endpoint.
///
/// An unset URL leaves the sink unconfigured; delivery then fails fast
/// instead of dropping content silently.
pub struct HttpSink {
    name: &'static str,
    url: Option<String>,
    client: reqwest::Client,
}

impl HttpSink {
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be constructed.
    pub fn new(
        name: &'static str,
        url: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { name, url, client })
    }
}

#[async_trait]
impl DeliverySink for HttpSink {
    fn name(&self) -> &str {
        self.name
    }

    fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    async fn deliver(
        &self,
        payload: &serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<(), SinkError> {
        let Some(url) = &self.url else {
            return Err(SinkError::Unconfigured);
        };

        let response = tokio::select! {
            result = self.client.post(url).json(payload).send() => {
                result.map_err(|e| SinkError::Delivery(e.to_string()))?
            }
            () = cancel.cancelled() => {
                return Err(SinkError::Delivery("delivery cancelled".to_owned()));
            }
        };

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SinkError::Delivery(format!(
                "{} sink returned {status}",
                self.name
            )))
        }
    }
}
