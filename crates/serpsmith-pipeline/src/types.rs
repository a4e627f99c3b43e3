use serde::{Deserialize, Serialize};

use serpsmith_analyze::SemanticProfile;
use serpsmith_extract::ExtractedPage;

/// One pipeline run's input. Immutable once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRequest {
    pub keyword: String,
    #[serde(default)]
    pub seed_url: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    /// Number of competitors to analyze.
    #[serde(default = "default_depth")]
    pub depth: usize,
}

fn default_depth() -> usize {
    5
}

impl KeywordRequest {
    #[must_use]
    pub fn new(keyword: &str) -> Self {
        Self {
            keyword: keyword.to_owned(),
            seed_url: None,
            locale: None,
            depth: default_depth(),
        }
    }
}

/// One competitor page paired with its semantic profile and SERP rank.
/// Assembled by the controller after extraction and analysis both succeed.
#[derive(Debug, Clone)]
pub struct PageAnalysis {
    pub page: ExtractedPage,
    pub profile: SemanticProfile,
    /// 1-based SERP rank; seed URLs outside the result set rank last.
    pub rank: u32,
}

/// One top-level outline section of a blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintSection {
    pub heading: String,
    pub sub_topics: Vec<String>,
    pub paa_questions: Vec<String>,
}

/// Structured content outline for one keyword request.
///
/// Versioned, never mutated in place: each quality rejection produces a new
/// version with widened candidate selection. `source_urls` records which
/// competitor pages the outline was built from, for auditability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    pub keyword: String,
    pub title_suggestion: String,
    pub sections: Vec<BlueprintSection>,
    pub recommended_word_count: usize,
    pub version: u32,
    pub source_urls: Vec<String>,
}

/// Raw quality dimension scores, each in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub factual_accuracy: f64,
    pub content_relevance: f64,
    pub structural_quality: f64,
    pub originality: f64,
    pub bias: f64,
}

/// Weighted quality verdict for one blueprint version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub dimensions: DimensionScores,
    pub composite: f64,
    pub pass: bool,
}

/// How many competitor pages made it through extraction and analysis, out of
/// how many were attempted. Carried on every outcome so partial data is
/// explicit, never masked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    pub extracted: usize,
    pub attempted: usize,
}

/// Final result of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub blueprint: Blueprint,
    pub quality: QualityScore,
    pub coverage: Coverage,
    /// True when the quality threshold was never met and the best-scoring
    /// version is returned instead.
    pub degraded: bool,
}
