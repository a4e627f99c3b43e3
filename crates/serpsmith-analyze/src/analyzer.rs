use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use serpsmith_client::{ApiClient, EndpointClass};
use serpsmith_extract::ExtractedPage;

use crate::error::AnalyzeError;
use crate::structure::structural_score;
use crate::types::{Entity, ProviderAnalysis, SemanticProfile, Topic};

/// Client for the NLP provider's analyze endpoint.
///
/// Constructed once at startup; `api_key` is optional so a deployment without
/// NLP credentials still starts, but every analysis call then fails fast with
/// [`AnalyzeError::Unconfigured`] instead of inventing a local profile.
pub struct Analyzer {
    api: Arc<ApiClient>,
    api_key: Option<String>,
    base_url: String,
}

impl Analyzer {
    #[must_use]
    pub fn new(api: Arc<ApiClient>, base_url: &str, api_key: Option<&str>) -> Self {
        Self {
            api,
            api_key: api_key.map(ToOwned::to_owned),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// True when NLP credentials are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Produces a semantic profile for one extracted page.
    ///
    /// Entity saliences and topic weights are normalized to sum to 1.0 within
    /// their collections; sentiment is clamped to [-1, 1]; the structural
    /// score is computed locally from the page's heading and paragraph shape.
    ///
    /// # Errors
    ///
    /// - [`AnalyzeError::Unconfigured`] if no NLP API key is set. No request
    ///   is sent in that case.
    /// - [`AnalyzeError::UpstreamFailure`] for provider failures.
    /// - [`AnalyzeError::Deserialize`] if the body does not match the
    ///   provider shape.
    pub async fn analyze(
        &self,
        page: &ExtractedPage,
        cancel: &CancellationToken,
    ) -> Result<SemanticProfile, AnalyzeError> {
        let api_key = self.api_key.as_deref().ok_or(AnalyzeError::Unconfigured)?;

        let payload = serde_json::json!({
            "document": {
                "headings": page.headings.iter().map(|h| h.text.as_str()).collect::<Vec<_>>(),
                "paragraph_count": page.paragraph_count,
                "word_count": page.word_count,
            },
        });

        let url = format!("{}/v1/analyze", self.base_url);
        let body = self
            .api
            .post_json(EndpointClass::Nlp, &url, Some(api_key), &payload, cancel)
            .await?;

        let analysis: ProviderAnalysis =
            serde_json::from_value(body).map_err(|e| AnalyzeError::Deserialize {
                context: page.source_url.clone(),
                source: e,
            })?;

        Ok(Self::build_profile(page, analysis))
    }

    fn build_profile(page: &ExtractedPage, analysis: ProviderAnalysis) -> SemanticProfile {
        let entities = normalize(
            analysis
                .entities
                .into_iter()
                .map(|e| Entity {
                    name: e.name,
                    entity_type: e.entity_type,
                    salience: e.salience,
                })
                .collect(),
            |e| &mut e.salience,
        );
        let topics = normalize(
            analysis
                .topics
                .into_iter()
                .map(|t| Topic {
                    label: t.label,
                    weight: t.weight,
                })
                .collect(),
            |t| &mut t.weight,
        );

        tracing::debug!(
            url = %page.source_url,
            entities = entities.len(),
            topics = topics.len(),
            "built semantic profile"
        );

        SemanticProfile {
            source_url: page.source_url.clone(),
            entities,
            topics,
            sentiment: analysis.sentiment.clamp(-1.0, 1.0),
            structural_score: structural_score(page),
        }
    }
}

/// Rescales the selected field so values sum to 1.0. Collections whose
/// weights sum to zero (or that are empty) are returned unchanged; there is
/// no meaningful distribution to recover.
fn normalize<T>(mut items: Vec<T>, field: impl Fn(&mut T) -> &mut f64) -> Vec<T> {
    let total: f64 = items
        .iter_mut()
        .map(|item| (*field(item)).max(0.0))
        .sum();
    if total > 0.0 {
        for item in &mut items {
            let value = field(item);
            *value = value.max(0.0) / total;
        }
    }
    items
}

#[cfg(test)]
#[path = "analyzer_test.rs"]
mod tests;
