//! SERP intelligence collection.
//!
//! Queries the search-results provider for a keyword and maps the response
//! into ranked competitor entries plus detected SERP features. Results are
//! always provider-reported reality: a provider failure propagates as an
//! error and is never substituted with synthetic placeholder data.

pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

pub use client::SerpClient;
pub use error::CollectorError;
pub use normalize::normalize_keyword;
pub use types::{SerpEntry, SerpFeature, SerpResultSet};
