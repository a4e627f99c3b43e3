use serde::{Deserialize, Serialize};

/// Named entity detected in a page, with provider-reported salience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub salience: f64,
}

/// Weighted topic label, ordered by weight descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub label: String,
    pub weight: f64,
}

/// Semantic profile derived from one extracted page. Immutable once built.
///
/// Entity saliences and topic weights are each normalized to sum to 1.0 so
/// profiles are comparable across pages regardless of provider scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticProfile {
    pub source_url: String,
    pub entities: Vec<Entity>,
    pub topics: Vec<Topic>,
    /// Overall sentiment in [-1, 1].
    pub sentiment: f64,
    /// Locally computed structural quality in [0, 1].
    pub structural_score: f64,
}

/// Wire shape of the NLP provider's analyze endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ProviderAnalysis {
    #[serde(default)]
    pub entities: Vec<ProviderEntity>,
    #[serde(default)]
    pub topics: Vec<ProviderTopic>,
    #[serde(default)]
    pub sentiment: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderEntity {
    pub name: String,
    #[serde(rename = "type", default)]
    pub entity_type: String,
    #[serde(default)]
    pub salience: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderTopic {
    pub label: String,
    #[serde(default)]
    pub weight: f64,
}
