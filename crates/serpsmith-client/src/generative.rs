//! Generative text capability with ordered provider fallback.
//!
//! The synthesizer depends only on [`ProviderChain`], never on a concrete
//! vendor, so tests substitute a stub and deployments reorder providers by
//! editing configuration.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::pacer::EndpointClass;

/// A provider able to turn a prompt into text.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str, cancel: &CancellationToken)
        -> Result<String, ApiError>;
}

/// Chat-completions-style provider (OpenAI wire format).
///
/// Calls `{base_url}/chat/completions` through the shared [`ApiClient`] so
/// generative traffic is paced like every other endpoint class.
pub struct ChatCompletionsProvider {
    client: Arc<ApiClient>,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsProvider {
    #[must_use]
    pub fn new(client: Arc<ApiClient>, base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            model: model.to_owned(),
        }
    }
}

#[async_trait]
impl GenerativeProvider for ChatCompletionsProvider {
    fn name(&self) -> &str {
        "chat-completions"
    }

    async fn generate(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = serde_json::json!({
            "model": self.model,
            "temperature": 0.1,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let body = self
            .client
            .post_json(
                EndpointClass::Generative,
                &url,
                Some(&self.api_key),
                &payload,
                cancel,
            )
            .await?;

        body.get("choices")
            .and_then(serde_json::Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(serde_json::Value::as_str)
            .map(|s| s.trim().to_owned())
            .ok_or_else(|| ApiError::MalformedResponse {
                context: url,
                reason: "missing choices[0].message.content".to_owned(),
            })
    }
}

/// Ordered fallback chain over configured providers.
///
/// Tries each provider in turn; a provider failure is logged and the next one
/// is attempted. An empty chain fails fast with
/// [`ApiError::NoProviderAvailable`] so callers can choose their own
/// deterministic fallback rather than receiving fabricated text.
#[derive(Clone, Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn GenerativeProvider>>,
}

impl ProviderChain {
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn GenerativeProvider>>) -> Self {
        Self { providers }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Generates text via the first provider that succeeds.
    ///
    /// # Errors
    ///
    /// - [`ApiError::NoProviderAvailable`] if no providers are configured.
    /// - [`ApiError::Cancelled`] immediately on cancellation.
    /// - Otherwise the last provider's error once all have failed.
    pub async fn generate(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        if self.providers.is_empty() {
            return Err(ApiError::NoProviderAvailable);
        }

        let mut last_err = ApiError::NoProviderAvailable;
        for provider in &self.providers {
            if cancel.is_cancelled() {
                return Err(ApiError::Cancelled);
            }
            match provider.generate(prompt, cancel).await {
                Ok(text) => return Ok(text),
                Err(ApiError::Cancelled) => return Err(ApiError::Cancelled),
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "generative provider failed, trying next in chain"
                    );
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StubProvider {
        name: &'static str,
        fail: bool,
        calls: AtomicU32,
    }

    #[async_trait]
    impl GenerativeProvider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate(
            &self,
            _prompt: &str,
            _cancel: &CancellationToken,
        ) -> Result<String, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ApiError::Upstream {
                    status: 500,
                    url: format!("https://{}.example.com", self.name),
                })
            } else {
                Ok(format!("text from {}", self.name))
            }
        }
    }

    fn stub(name: &'static str, fail: bool) -> Arc<StubProvider> {
        Arc::new(StubProvider {
            name,
            fail,
            calls: AtomicU32::new(0),
        })
    }

    #[tokio::test]
    async fn empty_chain_fails_fast() {
        let chain = ProviderChain::default();
        let result = chain.generate("prompt", &CancellationToken::new()).await;
        assert!(matches!(result, Err(ApiError::NoProviderAvailable)));
    }

    #[tokio::test]
    async fn first_success_wins_without_touching_later_providers() {
        let primary = stub("primary", false);
        let secondary = stub("secondary", false);
        let chain = ProviderChain::new(vec![
            primary.clone() as Arc<dyn GenerativeProvider>,
            secondary.clone() as Arc<dyn GenerativeProvider>,
        ]);

        let text = chain
            .generate("prompt", &CancellationToken::new())
            .await
            .expect("chain should succeed");
        assert_eq!(text, "text from primary");
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn falls_back_past_failing_provider() {
        let primary = stub("primary", true);
        let secondary = stub("secondary", false);
        let chain = ProviderChain::new(vec![
            primary.clone() as Arc<dyn GenerativeProvider>,
            secondary as Arc<dyn GenerativeProvider>,
        ]);

        let text = chain
            .generate("prompt", &CancellationToken::new())
            .await
            .expect("fallback should succeed");
        assert_eq!(text, "text from secondary");
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn returns_last_error_when_all_fail() {
        let chain = ProviderChain::new(vec![
            stub("a", true) as Arc<dyn GenerativeProvider>,
            stub("b", true) as Arc<dyn GenerativeProvider>,
        ]);
        let result = chain.generate("prompt", &CancellationToken::new()).await;
        assert!(matches!(result, Err(ApiError::Upstream { status: 500, .. })));
    }
}
