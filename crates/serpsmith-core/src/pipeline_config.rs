//! Pipeline tuning configuration loaded from YAML.
//!
//! Everything here changes pipeline *behavior* (pacing, caching, scoring,
//! synthesis) rather than deployment wiring, so it lives in a reviewable file
//! instead of env vars. The loaded values are hashed into a fingerprint that
//! becomes part of every cache key: a tuning change invalidates stale results
//! instead of silently serving blueprints built under the old knobs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ConfigError;

/// Weights sum tolerance. YAML carries decimal literals, so exact float
/// equality would reject valid files.
const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Minimum inter-call interval per endpoint class, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateIntervals {
    #[serde(default = "default_serp_interval")]
    pub serp_ms: u64,
    #[serde(default = "default_generative_interval")]
    pub generative_ms: u64,
    #[serde(default = "default_scrape_interval")]
    pub scrape_ms: u64,
    #[serde(default = "default_nlp_interval")]
    pub nlp_ms: u64,
}

fn default_serp_interval() -> u64 {
    1000
}
fn default_generative_interval() -> u64 {
    500
}
fn default_scrape_interval() -> u64 {
    2000
}
fn default_nlp_interval() -> u64 {
    500
}

impl Default for RateIntervals {
    fn default() -> Self {
        Self {
            serp_ms: default_serp_interval(),
            generative_ms: default_generative_interval(),
            scrape_ms: default_scrape_interval(),
            nlp_ms: default_nlp_interval(),
        }
    }
}

/// Cache expiry policy. Expired entries are treated as absent in `Strict`
/// mode; `StaleWhileRevalidate` serves the stale value and recomputes in the
/// background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    Strict,
    StaleWhileRevalidate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    #[serde(default = "default_cache_mode")]
    pub mode: CacheMode,
    #[serde(default = "default_serp_ttl")]
    pub serp_ttl_secs: u64,
    #[serde(default = "default_extract_ttl")]
    pub extract_ttl_secs: u64,
    #[serde(default = "default_analyze_ttl")]
    pub analyze_ttl_secs: u64,
}

fn default_cache_mode() -> CacheMode {
    CacheMode::Strict
}
fn default_serp_ttl() -> u64 {
    3_600
}
fn default_extract_ttl() -> u64 {
    21_600
}
fn default_analyze_ttl() -> u64 {
    21_600
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            mode: default_cache_mode(),
            serp_ttl_secs: default_serp_ttl(),
            extract_ttl_secs: default_extract_ttl(),
            analyze_ttl_secs: default_analyze_ttl(),
        }
    }
}

/// Per-dimension quality weights. Must sum to 1.0 (validated at load).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QualityWeights {
    pub factual_accuracy: f64,
    pub content_relevance: f64,
    pub structural_quality: f64,
    pub originality: f64,
    pub bias: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            factual_accuracy: 0.3,
            content_relevance: 0.25,
            structural_quality: 0.2,
            originality: 0.15,
            bias: 0.1,
        }
    }
}

impl QualityWeights {
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.factual_accuracy
            + self.content_relevance
            + self.structural_quality
            + self.originality
            + self.bias
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QualitySettings {
    #[serde(default)]
    pub weights: QualityWeights,
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
    #[serde(default = "default_max_synthesis_retries")]
    pub max_synthesis_retries: u32,
}

fn default_pass_threshold() -> f64 {
    0.6
}
fn default_max_synthesis_retries() -> u32 {
    2
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            weights: QualityWeights::default(),
            pass_threshold: default_pass_threshold(),
            max_synthesis_retries: default_max_synthesis_retries(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SynthesisParams {
    /// Target number of top-level headings in the outline (typical H2 count).
    #[serde(default = "default_heading_count")]
    pub target_heading_count: usize,
    /// Recommended word count = competitor median × this multiplier.
    #[serde(default = "default_word_count_multiplier")]
    pub word_count_multiplier: f64,
}

fn default_heading_count() -> usize {
    6
}
fn default_word_count_multiplier() -> f64 {
    1.1
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            target_heading_count: default_heading_count(),
            word_count_multiplier: default_word_count_multiplier(),
        }
    }
}

/// Full pipeline tuning configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub rate_intervals: RateIntervals,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub quality: QualitySettings,
    #[serde(default)]
    pub synthesis: SynthesisParams,
    #[serde(default = "default_concurrency_cap")]
    pub concurrency_cap: usize,
}

fn default_concurrency_cap() -> usize {
    10
}

// Default must agree with the serde defaults so an empty YAML document and
// `PipelineConfig::default()` describe the same configuration.
impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rate_intervals: RateIntervals::default(),
            cache: CacheSettings::default(),
            quality: QualitySettings::default(),
            synthesis: SynthesisParams::default(),
            concurrency_cap: default_concurrency_cap(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate the tuning file at `path`.
    ///
    /// A missing file is an error: the deployment must ship an explicit file
    /// (even an empty `{}` document, which yields all defaults).
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Io`] / [`ConfigError::Yaml`] for unreadable input.
    /// - [`ConfigError::WeightsInvalid`] if quality weights do not sum to 1.0.
    /// - [`ConfigError::Invalid`] for out-of-range knobs.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = serde_yaml::from_str(&raw).map_err(|e| ConfigError::Yaml {
            path: path.display().to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// See [`PipelineConfig::load`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.quality.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(ConfigError::WeightsInvalid { sum });
        }
        if !(0.0..=1.0).contains(&self.quality.pass_threshold) {
            return Err(ConfigError::Invalid(format!(
                "quality.pass_threshold must be in [0, 1], got {}",
                self.quality.pass_threshold
            )));
        }
        if self.synthesis.target_heading_count == 0 {
            return Err(ConfigError::Invalid(
                "synthesis.target_heading_count must be at least 1".to_string(),
            ));
        }
        if self.synthesis.word_count_multiplier <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "synthesis.word_count_multiplier must be positive, got {}",
                self.synthesis.word_count_multiplier
            )));
        }
        if self.concurrency_cap == 0 {
            return Err(ConfigError::Invalid(
                "concurrency_cap must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Stable hex fingerprint of the tuning values, embedded in cache keys.
    ///
    /// Serializes through YAML (field order is declaration order, not map
    /// iteration order) and hashes the result, so equal configs always produce
    /// equal fingerprints.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let canonical = serde_yaml::to_string(self).unwrap_or_default();
        let digest = Sha256::digest(canonical.as_bytes());
        let mut out = String::with_capacity(16);
        // First 8 bytes are plenty to distinguish configurations.
        for byte in digest.iter().take(8) {
            use std::fmt::Write;
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.quality.weights.sum() - 1.0).abs() < WEIGHT_SUM_EPSILON);
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config: PipelineConfig = serde_yaml::from_str("{}").expect("parse empty doc");
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn invalid_weights_rejected_at_load_not_scoring_time() {
        let yaml = r"
quality:
  weights:
    factual_accuracy: 0.5
    content_relevance: 0.25
    structural_quality: 0.2
    originality: 0.15
    bias: 0.1
";
        let config: PipelineConfig = serde_yaml::from_str(yaml).expect("parse");
        let result = config.validate();
        assert!(
            matches!(result, Err(ConfigError::WeightsInvalid { sum }) if (sum - 1.2).abs() < 1e-9),
            "expected WeightsInvalid, got: {result:?}"
        );
    }

    #[test]
    fn threshold_outside_unit_interval_rejected() {
        let yaml = "quality:\n  pass_threshold: 1.5\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).expect("parse");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_heading_count_rejected() {
        let yaml = "synthesis:\n  target_heading_count: 0\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).expect("parse");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn cache_mode_parses_kebab_case() {
        let yaml = "cache:\n  mode: stale-while-revalidate\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(config.cache.mode, CacheMode::StaleWhileRevalidate);
    }

    #[test]
    fn fingerprint_is_stable_for_equal_configs() {
        let a = PipelineConfig::default();
        let b = PipelineConfig::default();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_changes_when_tuning_changes() {
        let a = PipelineConfig::default();
        let mut b = PipelineConfig::default();
        b.synthesis.target_heading_count = 8;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn unknown_fields_rejected() {
        let result = serde_yaml::from_str::<PipelineConfig>("not_a_knob: 1\n");
        assert!(result.is_err());
    }
}
