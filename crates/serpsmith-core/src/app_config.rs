use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-level configuration loaded from environment variables.
///
/// Provider base URLs default to the real endpoints and are overridable so
/// tests can point the clients at a mock server.
#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub pipeline_config_path: PathBuf,
    /// Search provider credential. Required: every run starts with a SERP query.
    pub serp_api_key: String,
    /// NLP provider credential. Absence makes `analyze` fail per call with
    /// `Unconfigured` rather than degrading silently.
    pub nlp_api_key: Option<String>,
    /// Generative provider credential, used by the title-suggestion chain.
    pub generative_api_key: Option<String>,
    pub serp_base_url: String,
    pub nlp_base_url: String,
    pub generative_base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub export_sink_url: Option<String>,
    pub publish_sink_url: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("pipeline_config_path", &self.pipeline_config_path)
            .field("serp_api_key", &"[redacted]")
            .field("nlp_api_key", &self.nlp_api_key.as_ref().map(|_| "[redacted]"))
            .field(
                "generative_api_key",
                &self.generative_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("serp_base_url", &self.serp_base_url)
            .field("nlp_base_url", &self.nlp_base_url)
            .field("generative_base_url", &self.generative_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("export_sink_url", &self.export_sink_url)
            .field("publish_sink_url", &self.publish_sink_url)
            .finish()
    }
}
