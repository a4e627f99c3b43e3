use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use serpsmith_analyze::{AnalyzeError, SemanticProfile};
use serpsmith_cache::{Cache, CacheError, CacheKey, OperationKind};
use serpsmith_core::PipelineConfig;
use serpsmith_extract::{ExtractError, ExtractedPage};
use serpsmith_serp::{normalize_keyword, CollectorError, SerpResultSet};

use crate::error::PipelineError;
use crate::score::{score, ScoreContext};
use crate::synthesize::synthesize;
use crate::types::{Coverage, KeywordRequest, PageAnalysis, PipelineOutcome};

/// Source of SERP result sets for a keyword.
#[async_trait]
pub trait SerpSource: Send + Sync {
    async fn collect(
        &self,
        keyword: &str,
        depth: usize,
        locale: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<SerpResultSet, CollectorError>;
}

/// Source of extracted competitor pages.
#[async_trait]
pub trait PageExtractor: Send + Sync {
    async fn extract(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ExtractedPage, ExtractError>;
}

/// Source of semantic profiles for extracted pages.
#[async_trait]
pub trait SemanticAnalyzer: Send + Sync {
    /// False when provider credentials are missing; the controller fails a
    /// run before any collection work in that case.
    fn is_configured(&self) -> bool {
        true
    }

    async fn analyze(
        &self,
        page: &ExtractedPage,
        cancel: &CancellationToken,
    ) -> Result<SemanticProfile, AnalyzeError>;
}

/// Orchestrates one pipeline run per keyword request.
///
/// Collection and per-URL extraction/analysis results are memoized in TTL
/// caches keyed by subject and configuration fingerprint, so repeated
/// requests within the TTL window never refetch. The synthesis/scoring loop
/// is a bounded state machine: a rejected blueprint triggers regeneration
/// with a widened candidate selection, at most `max_synthesis_retries` times,
/// after which the best-scoring version is returned marked degraded.
pub struct Controller {
    serp: Arc<dyn SerpSource>,
    extractor: Arc<dyn PageExtractor>,
    analyzer: Arc<dyn SemanticAnalyzer>,
    config: PipelineConfig,
    fingerprint: String,
    serp_cache: Arc<Cache<SerpResultSet>>,
    page_cache: Arc<Cache<ExtractedPage>>,
    profile_cache: Arc<Cache<SemanticProfile>>,
}

impl Controller {
    #[must_use]
    pub fn new(
        serp: Arc<dyn SerpSource>,
        extractor: Arc<dyn PageExtractor>,
        analyzer: Arc<dyn SemanticAnalyzer>,
        config: PipelineConfig,
    ) -> Self {
        let fingerprint = config.fingerprint();
        let mode = config.cache.mode;
        Self {
            serp,
            extractor,
            analyzer,
            config,
            fingerprint,
            serp_cache: Arc::new(Cache::new(mode)),
            page_cache: Arc::new(Cache::new(mode)),
            profile_cache: Arc::new(Cache::new(mode)),
        }
    }

    /// Executes one run end to end.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::AnalyzerUnconfigured`] before any collection work
    ///   if NLP credentials are missing.
    /// - [`PipelineError::Collection`] when SERP collection fails; the
    ///   message carries the underlying cause.
    /// - [`PipelineError::NoCoverage`] when not a single competitor page
    ///   survived extraction and analysis.
    /// - [`PipelineError::Cancelled`] when `cancel` fires at any stage.
    pub async fn run(
        &self,
        request: &KeywordRequest,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutcome, PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        if !self.analyzer.is_configured() {
            return Err(PipelineError::AnalyzerUnconfigured);
        }

        let keyword = normalize_keyword(&request.keyword);
        let serp_set = self
            .collect_serp(&keyword, request.depth, request.locale.as_deref(), cancel)
            .await?;

        let targets = Self::targets(&serp_set, request.seed_url.as_deref());
        let attempted = targets.len();
        let analyses = self.gather_analyses(targets, cancel).await;
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let coverage = Coverage {
            extracted: analyses.len(),
            attempted,
        };
        if analyses.is_empty() {
            return Err(PipelineError::NoCoverage { attempted });
        }
        tracing::info!(
            keyword = %keyword,
            extracted = coverage.extracted,
            attempted = coverage.attempted,
            "competitor field assembled"
        );

        let ctx = ScoreContext {
            analyses: &analyses,
            coverage,
        };

        let blueprint = synthesize(
            &serp_set,
            &analyses,
            &self.config.synthesis,
            self.candidate_count(0),
            1,
        );
        let quality = score(&blueprint, &ctx, &self.config.quality);
        if quality.pass {
            return Ok(PipelineOutcome {
                blueprint,
                quality,
                coverage,
                degraded: false,
            });
        }

        let (mut best_blueprint, mut best_quality) = (blueprint, quality);
        for retry in 1..=self.config.quality.max_synthesis_retries {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }
            let version = retry + 1;
            tracing::info!(
                keyword = %keyword,
                version,
                rejected_composite = best_quality.composite,
                "quality below threshold, regenerating with widened selection"
            );
            let blueprint = synthesize(
                &serp_set,
                &analyses,
                &self.config.synthesis,
                self.candidate_count(retry as usize),
                version,
            );
            let quality = score(&blueprint, &ctx, &self.config.quality);
            if quality.pass {
                return Ok(PipelineOutcome {
                    blueprint,
                    quality,
                    coverage,
                    degraded: false,
                });
            }
            if quality.composite > best_quality.composite {
                best_blueprint = blueprint;
                best_quality = quality;
            }
        }

        tracing::warn!(
            keyword = %keyword,
            best_version = best_blueprint.version,
            composite = best_quality.composite,
            "quality threshold never met, returning best version degraded"
        );
        Ok(PipelineOutcome {
            blueprint: best_blueprint,
            quality: best_quality,
            coverage,
            degraded: true,
        })
    }

    /// Each regeneration widens the candidate selection by two headings.
    fn candidate_count(&self, attempt: usize) -> usize {
        self.config.synthesis.target_heading_count + attempt * 2
    }

    /// Competitor URLs with their ranks; a seed URL outside the result set is
    /// appended and ranked last.
    #[allow(clippy::cast_possible_truncation)]
    fn targets(serp_set: &SerpResultSet, seed_url: Option<&str>) -> Vec<(String, u32)> {
        let mut targets: Vec<(String, u32)> = serp_set
            .results
            .iter()
            .map(|entry| (entry.url.clone(), entry.rank))
            .collect();
        if let Some(seed) = seed_url {
            if !targets.iter().any(|(url, _)| url == seed) {
                let rank = targets.len() as u32 + 1;
                targets.push((seed.to_owned(), rank));
            }
        }
        targets
    }

    async fn collect_serp(
        &self,
        keyword: &str,
        depth: usize,
        locale: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<SerpResultSet, PipelineError> {
        // Locale is part of the subject: localized result sets never alias.
        let subject = match locale {
            Some(locale) => format!("{keyword}#d{depth}#{locale}"),
            None => format!("{keyword}#d{depth}"),
        };
        let key = CacheKey {
            kind: OperationKind::Serp,
            subject,
            config_fingerprint: self.fingerprint.clone(),
        };
        let serp = Arc::clone(&self.serp);
        let owned_keyword = keyword.to_owned();
        let owned_locale = locale.map(ToOwned::to_owned);
        let token = cancel.clone();
        self.serp_cache
            .get_or_compute(
                key,
                Duration::from_secs(self.config.cache.serp_ttl_secs),
                move || async move {
                    serp.collect(&owned_keyword, depth, owned_locale.as_deref(), &token)
                        .await
                        .map_err(|e| e.to_string())
                },
            )
            .await
            .map_err(|error| {
                if cancel.is_cancelled() {
                    PipelineError::Cancelled
                } else {
                    PipelineError::Collection {
                        message: stage_message(error),
                    }
                }
            })
    }

    /// Extracts and analyzes every target with bounded concurrency. Failed
    /// URLs are logged and dropped; survivors keep target order.
    async fn gather_analyses(
        &self,
        targets: Vec<(String, u32)>,
        cancel: &CancellationToken,
    ) -> Vec<PageAnalysis> {
        let concurrency = self.config.concurrency_cap.min(targets.len()).max(1);
        futures::stream::iter(targets)
            .map(|(url, rank)| async move { self.analyzed_page(&url, rank, cancel).await })
            .buffered(concurrency)
            .filter_map(|analysis| async move { analysis })
            .collect()
            .await
    }

    async fn analyzed_page(
        &self,
        url: &str,
        rank: u32,
        cancel: &CancellationToken,
    ) -> Option<PageAnalysis> {
        let page = match self.cached_page(url, cancel).await {
            Ok(page) => page,
            Err(error) => {
                tracing::warn!(%url, error = %stage_message(error), "competitor page skipped");
                return None;
            }
        };
        match self.cached_profile(&page, cancel).await {
            Ok(profile) => Some(PageAnalysis {
                page,
                profile,
                rank,
            }),
            Err(error) => {
                tracing::warn!(%url, error = %stage_message(error), "semantic analysis skipped");
                None
            }
        }
    }

    async fn cached_page(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ExtractedPage, CacheError> {
        let key = CacheKey {
            kind: OperationKind::Extract,
            subject: url.to_owned(),
            config_fingerprint: self.fingerprint.clone(),
        };
        let extractor = Arc::clone(&self.extractor);
        let owned_url = url.to_owned();
        let token = cancel.clone();
        self.page_cache
            .get_or_compute(
                key,
                Duration::from_secs(self.config.cache.extract_ttl_secs),
                move || async move {
                    extractor
                        .extract(&owned_url, &token)
                        .await
                        .map_err(|e| e.to_string())
                },
            )
            .await
    }

    async fn cached_profile(
        &self,
        page: &ExtractedPage,
        cancel: &CancellationToken,
    ) -> Result<SemanticProfile, CacheError> {
        let key = CacheKey {
            kind: OperationKind::Analyze,
            subject: page.source_url.clone(),
            config_fingerprint: self.fingerprint.clone(),
        };
        let analyzer = Arc::clone(&self.analyzer);
        let owned_page = page.clone();
        let token = cancel.clone();
        self.profile_cache
            .get_or_compute(
                key,
                Duration::from_secs(self.config.cache.analyze_ttl_secs),
                move || async move {
                    analyzer
                        .analyze(&owned_page, &token)
                        .await
                        .map_err(|e| e.to_string())
                },
            )
            .await
    }
}

/// Cache failures wrap the underlying cause as a string; surface just the
/// cause, not the cache bookkeeping.
fn stage_message(error: CacheError) -> String {
    match error {
        CacheError::ComputeFailed { message, .. } => message,
        other @ CacheError::Abandoned { .. } => other.to_string(),
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
