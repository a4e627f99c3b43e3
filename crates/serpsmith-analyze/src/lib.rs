//! Semantic analysis of extracted competitor pages.
//!
//! Entities, topics, and sentiment come from an external NLP provider; the
//! structural score is computed locally from the page's heading and paragraph
//! shape. Missing NLP credentials fail fast as [`AnalyzeError::Unconfigured`]
//! rather than degrading to a local approximation.

pub mod analyzer;
pub mod error;
pub mod structure;
pub mod types;

pub use analyzer::Analyzer;
pub use error::AnalyzeError;
pub use types::{Entity, SemanticProfile, Topic};
