//! Controller trait implementations over the concrete client crates.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use serpsmith_analyze::{AnalyzeError, Analyzer, SemanticProfile};
use serpsmith_extract::{ExtractError, ExtractedPage, Extractor};
use serpsmith_serp::{CollectorError, SerpClient, SerpResultSet};

use crate::controller::{PageExtractor, SemanticAnalyzer, SerpSource};

#[async_trait]
impl SerpSource for SerpClient {
    async fn collect(
        &self,
        keyword: &str,
        depth: usize,
        locale: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<SerpResultSet, CollectorError> {
        SerpClient::collect(self, keyword, depth, locale, cancel).await
    }
}

#[async_trait]
impl PageExtractor for Extractor {
    async fn extract(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ExtractedPage, ExtractError> {
        Extractor::extract(self, url, cancel).await
    }
}

#[async_trait]
impl SemanticAnalyzer for Analyzer {
    fn is_configured(&self) -> bool {
        Analyzer::is_configured(self)
    }

    async fn analyze(
        &self,
        page: &ExtractedPage,
        cancel: &CancellationToken,
    ) -> Result<SemanticProfile, AnalyzeError> {
        Analyzer::analyze(self, page, cancel).await
    }
}
