//! Shared configuration for the serpsmith pipeline.
//!
//! Environment variables carry deployment concerns (credentials, bind address,
//! timeouts); a YAML tuning file carries pipeline behavior (rate intervals,
//! cache TTLs, quality weights, synthesis knobs). Both are validated at load
//! time so a misconfigured process fails at startup, not mid-run.

mod app_config;
mod config;
mod pipeline_config;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use pipeline_config::{
    CacheMode, CacheSettings, PipelineConfig, QualitySettings, QualityWeights, RateIntervals,
    SynthesisParams,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("cannot read pipeline config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse pipeline config {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("quality dimension weights must sum to 1.0, got {sum}")]
    WeightsInvalid { sum: f64 },

    #[error("invalid pipeline config: {0}")]
    Invalid(String),
}
