//! Blueprint generation pipeline.
//!
//! Orchestrates one run per keyword request: SERP collection, per-competitor
//! page extraction and semantic analysis (both cached and failure-isolated),
//! deterministic blueprint synthesis, and quality scoring with a bounded
//! regeneration loop. The controller talks to its collaborators through
//! traits so runs are testable without any network.

pub mod adapters;
pub mod controller;
pub mod error;
pub mod score;
pub mod synthesize;
pub mod types;

pub use controller::{Controller, PageExtractor, SemanticAnalyzer, SerpSource};
pub use error::PipelineError;
pub use types::{
    Blueprint, BlueprintSection, Coverage, DimensionScores, KeywordRequest, PageAnalysis,
    PipelineOutcome, QualityScore,
};
