use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files, which is useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup without `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let serp_api_key = require("SERPSMITH_SERP_API_KEY")?;

    let env = parse_environment(&or_default("SERPSMITH_ENV", "development"));
    let bind_addr = parse_addr("SERPSMITH_BIND_ADDR", "0.0.0.0:3400")?;
    let log_level = or_default("SERPSMITH_LOG_LEVEL", "info");
    let pipeline_config_path = PathBuf::from(or_default(
        "SERPSMITH_PIPELINE_CONFIG_PATH",
        "./config/pipeline.yaml",
    ));

    let nlp_api_key = lookup("SERPSMITH_NLP_API_KEY").ok();
    let generative_api_key = lookup("SERPSMITH_GENERATIVE_API_KEY").ok();

    let serp_base_url = or_default("SERPSMITH_SERP_BASE_URL", "https://serpapi.com/search");
    let nlp_base_url = or_default(
        "SERPSMITH_NLP_BASE_URL",
        "https://language.googleapis.com/v1",
    );
    let generative_base_url = or_default(
        "SERPSMITH_GENERATIVE_BASE_URL",
        "https://api.openai.com/v1",
    );

    let request_timeout_secs = parse_u64("SERPSMITH_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("SERPSMITH_USER_AGENT", "serpsmith/0.1 (content-intelligence)");
    let max_retries = parse_u32("SERPSMITH_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("SERPSMITH_RETRY_BACKOFF_BASE_MS", "500")?;

    let export_sink_url = lookup("SERPSMITH_EXPORT_SINK_URL").ok();
    let publish_sink_url = lookup("SERPSMITH_PUBLISH_SINK_URL").ok();

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        pipeline_config_path,
        serp_api_key,
        nlp_api_key,
        generative_api_key,
        serp_base_url,
        nlp_base_url,
        generative_base_url,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        export_sink_url,
        publish_sink_url,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
