mod api;
mod middleware;
mod sinks;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use serpsmith_analyze::Analyzer;
use serpsmith_client::{ApiClient, ChatCompletionsProvider, GenerativeProvider, ProviderChain};
use serpsmith_core::{Environment, PipelineConfig};
use serpsmith_extract::Extractor;
use serpsmith_pipeline::{Controller, PageExtractor, SemanticAnalyzer, SerpSource};
use serpsmith_serp::SerpClient;

use crate::{
    api::{build_app, default_rate_limit_state, AppState, ProviderHealth},
    middleware::AuthState,
    sinks::{DeliverySink, HttpSink},
};

const GENERATIVE_MODEL: &str = "gpt-4o-mini";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = serpsmith_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pipeline_config = PipelineConfig::load(&config.pipeline_config_path)?;

    let api = Arc::new(ApiClient::new(
        &pipeline_config.rate_intervals,
        config.request_timeout_secs,
        &config.user_agent,
        config.max_retries,
        config.retry_backoff_base_ms,
    )?);

    let serp = Arc::new(SerpClient::new(
        Arc::clone(&api),
        &config.serp_base_url,
        &config.serp_api_key,
    )) as Arc<dyn SerpSource>;
    let extractor = Arc::new(Extractor::new(Arc::clone(&api))) as Arc<dyn PageExtractor>;
    let analyzer = Arc::new(Analyzer::new(
        Arc::clone(&api),
        &config.nlp_base_url,
        config.nlp_api_key.as_deref(),
    )) as Arc<dyn SemanticAnalyzer>;

    let generative = config.generative_api_key.as_deref().map_or_else(
        ProviderChain::default,
        |key| {
            ProviderChain::new(vec![Arc::new(ChatCompletionsProvider::new(
                Arc::clone(&api),
                &config.generative_base_url,
                key,
                GENERATIVE_MODEL,
            )) as Arc<dyn GenerativeProvider>])
        },
    );

    let export_sink = Arc::new(HttpSink::new(
        "export",
        config.export_sink_url.clone(),
        config.request_timeout_secs,
    )?) as Arc<dyn DeliverySink>;
    let publish_sink = Arc::new(HttpSink::new(
        "publish",
        config.publish_sink_url.clone(),
        config.request_timeout_secs,
    )?) as Arc<dyn DeliverySink>;

    let providers = ProviderHealth {
        serp: true,
        nlp: config.nlp_api_key.is_some(),
        generative: !generative.is_empty(),
        export_sink: export_sink.is_configured(),
        publish_sink: publish_sink.is_configured(),
    };

    let controller = Arc::new(Controller::new(
        serp,
        Arc::clone(&extractor),
        Arc::clone(&analyzer),
        pipeline_config,
    ));

    let shutdown = CancellationToken::new();
    let state = AppState {
        controller,
        extractor,
        analyzer,
        generative,
        export_sink,
        publish_sink,
        providers,
        shutdown: shutdown.clone(),
    };

    let auth = AuthState::from_env(matches!(config.env, Environment::Development))?;
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
    shutdown.cancel();
}
