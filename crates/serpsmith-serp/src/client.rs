use std::sync::Arc;

use reqwest::Url;
use tokio_util::sync::CancellationToken;

use serpsmith_client::{ApiClient, EndpointClass};

use crate::error::CollectorError;
use crate::normalize::normalize_keyword;
use crate::types::{
    ProviderResponse, SerpEntry, SerpFeature, SerpResultSet,
};

/// Client for the search-results provider.
///
/// Use [`SerpClient::new`] for production or point `base_url` at a mock
/// server in tests. All traffic goes through the shared [`ApiClient`] on the
/// serp endpoint class, so pacing and retry policy apply uniformly.
pub struct SerpClient {
    api: Arc<ApiClient>,
    api_key: String,
    base_url: String,
}

impl SerpClient {
    #[must_use]
    pub fn new(api: Arc<ApiClient>, base_url: &str, api_key: &str) -> Self {
        Self {
            api,
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Collects at most `depth` organic results plus SERP features for a
    /// keyword, optionally localized (`locale` becomes the provider's host
    /// language parameter).
    ///
    /// The keyword is normalized (trim, lowercase, collapse whitespace)
    /// before dispatch; provider rank order is preserved exactly; entries
    /// are never reordered or deduplicated here.
    ///
    /// # Errors
    ///
    /// - [`CollectorError::InvalidInput`] if the keyword is empty after
    ///   normalization.
    /// - [`CollectorError::UpstreamFailure`] for any provider failure; no
    ///   synthetic fallback data is ever generated.
    /// - [`CollectorError::Deserialize`] if the response body does not match
    ///   the provider shape.
    pub async fn collect(
        &self,
        keyword: &str,
        depth: usize,
        locale: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<SerpResultSet, CollectorError> {
        let normalized = normalize_keyword(keyword);
        if normalized.is_empty() {
            return Err(CollectorError::InvalidInput(
                "keyword is empty after normalization".to_owned(),
            ));
        }

        let url = self.build_url(&normalized, depth, locale)?;
        let body = self
            .api
            .get_json(EndpointClass::Serp, url.as_str(), cancel)
            .await?;

        let provider: ProviderResponse =
            serde_json::from_value(body).map_err(|e| CollectorError::Deserialize {
                context: format!("search(q={normalized})"),
                source: e,
            })?;

        Ok(Self::map_response(normalized, depth, provider))
    }

    /// Builds the provider query URL with percent-encoded parameters.
    fn build_url(
        &self,
        keyword: &str,
        depth: usize,
        locale: Option<&str>,
    ) -> Result<Url, CollectorError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            CollectorError::InvalidInput(format!("invalid SERP base URL {}: {e}", self.base_url))
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("api_key", &self.api_key)
                .append_pair("q", keyword)
                .append_pair("num", &depth.to_string());
            if let Some(locale) = locale {
                pairs.append_pair("hl", locale);
            }
        }
        Ok(url)
    }

    /// Maps the provider document into the pipeline's result set.
    ///
    /// Entries keep provider order (stable truncation to `depth`); missing
    /// `position` values fall back to the 1-based list index so downstream
    /// inverse-rank weighting always has a rank.
    fn map_response(keyword: String, depth: usize, provider: ProviderResponse) -> SerpResultSet {
        let results: Vec<SerpEntry> = provider
            .organic_results
            .into_iter()
            .take(depth)
            .enumerate()
            .map(|(idx, item)| SerpEntry {
                url: item.link,
                #[allow(clippy::cast_possible_truncation)]
                rank: item.position.unwrap_or(idx as u32 + 1),
                title: item.title,
                snippet: item.snippet,
            })
            .collect();

        let mut features = Vec::new();
        if let Some(answer_box) = provider.answer_box {
            if !answer_box.snippet.is_empty() {
                features.push(SerpFeature::FeaturedSnippet {
                    text: answer_box.snippet,
                });
            }
        }
        if !provider.related_questions.is_empty() {
            features.push(SerpFeature::PeopleAlsoAsk {
                questions: provider
                    .related_questions
                    .into_iter()
                    .map(|q| q.question)
                    .collect(),
            });
        }
        if let Some(graph) = provider.knowledge_graph {
            if !graph.title.is_empty() {
                features.push(SerpFeature::KnowledgeGraph { entity: graph.title });
            }
        }

        tracing::debug!(
            keyword = %keyword,
            results = results.len(),
            features = features.len(),
            "collected SERP result set"
        );

        SerpResultSet {
            keyword,
            results,
            features,
        }
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
