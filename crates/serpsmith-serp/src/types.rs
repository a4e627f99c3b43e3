use serde::{Deserialize, Serialize};

/// One ranked organic result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerpEntry {
    pub url: String,
    /// Provider-reported rank, 1-based.
    pub rank: u32,
    pub title: String,
    pub snippet: String,
}

/// SERP features detected alongside organic results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SerpFeature {
    FeaturedSnippet { text: String },
    PeopleAlsoAsk { questions: Vec<String> },
    KnowledgeGraph { entity: String },
}

/// Provider-reported results for one keyword. Produced once per pipeline run
/// and read-only downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerpResultSet {
    /// Normalized keyword the set was collected for.
    pub keyword: String,
    /// Organic results in provider rank order, at most the requested depth.
    pub results: Vec<SerpEntry>,
    pub features: Vec<SerpFeature>,
}

impl SerpResultSet {
    /// People-Also-Ask questions, if that feature was detected.
    #[must_use]
    pub fn paa_questions(&self) -> Vec<&str> {
        self.features
            .iter()
            .find_map(|f| match f {
                SerpFeature::PeopleAlsoAsk { questions } => {
                    Some(questions.iter().map(String::as_str).collect())
                }
                _ => None,
            })
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Provider wire types. The search provider returns a flat JSON document with
// optional feature blocks; unknown fields are ignored.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderResponse {
    #[serde(default)]
    pub organic_results: Vec<ProviderOrganicResult>,
    #[serde(default)]
    pub answer_box: Option<ProviderAnswerBox>,
    #[serde(default)]
    pub related_questions: Vec<ProviderRelatedQuestion>,
    #[serde(default)]
    pub knowledge_graph: Option<ProviderKnowledgeGraph>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderOrganicResult {
    pub link: String,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderAnswerBox {
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderRelatedQuestion {
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderKnowledgeGraph {
    #[serde(default)]
    pub title: String,
}
