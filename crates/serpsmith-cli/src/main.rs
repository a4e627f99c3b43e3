use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use serpsmith_analyze::Analyzer;
use serpsmith_client::ApiClient;
use serpsmith_core::{AppConfig, PipelineConfig};
use serpsmith_extract::Extractor;
use serpsmith_pipeline::{
    Controller, KeywordRequest, PageExtractor, SemanticAnalyzer, SerpSource,
};
use serpsmith_serp::SerpClient;

#[derive(Debug, Parser)]
#[command(name = "serpsmith-cli")]
#[command(about = "Serpsmith content blueprint pipeline, from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the full pipeline for a keyword and print the outcome as JSON.
    Process {
        keyword: String,
        /// Number of competitors to analyze (1-10).
        #[arg(long, default_value_t = 5)]
        depth: usize,
        /// Extra competitor URL to include alongside SERP results.
        #[arg(long)]
        seed_url: Option<String>,
        /// SERP locale, forwarded to the provider (e.g. "de").
        #[arg(long)]
        locale: Option<String>,
    },
    /// Extract and profile a single page, printing the result as JSON.
    AnalyzeUrl { url: String },
    /// Print the resolved pipeline configuration and its fingerprint.
    ShowConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = serpsmith_core::load_app_config()?;
    let pipeline_config = PipelineConfig::load(&config.pipeline_config_path)?;

    match cli.command {
        Commands::Process {
            keyword,
            depth,
            seed_url,
            locale,
        } => run_process(&config, pipeline_config, &keyword, depth, seed_url, locale).await,
        Commands::AnalyzeUrl { url } => run_analyze_url(&config, &pipeline_config, &url).await,
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&pipeline_config)?);
            println!("fingerprint: {}", pipeline_config.fingerprint());
            Ok(())
        }
    }
}

fn build_api(config: &AppConfig, pipeline_config: &PipelineConfig) -> anyhow::Result<Arc<ApiClient>> {
    Ok(Arc::new(ApiClient::new(
        &pipeline_config.rate_intervals,
        config.request_timeout_secs,
        &config.user_agent,
        config.max_retries,
        config.retry_backoff_base_ms,
    )?))
}

async fn run_process(
    config: &AppConfig,
    pipeline_config: PipelineConfig,
    keyword: &str,
    depth: usize,
    seed_url: Option<String>,
    locale: Option<String>,
) -> anyhow::Result<()> {
    let api = build_api(config, &pipeline_config)?;
    let serp = Arc::new(SerpClient::new(
        Arc::clone(&api),
        &config.serp_base_url,
        &config.serp_api_key,
    ));
    let extractor = Arc::new(Extractor::new(Arc::clone(&api)));
    let analyzer = Arc::new(Analyzer::new(
        Arc::clone(&api),
        &config.nlp_base_url,
        config.nlp_api_key.as_deref(),
    ));
    let controller = Controller::new(
        serp as Arc<dyn SerpSource>,
        extractor as Arc<dyn PageExtractor>,
        analyzer as Arc<dyn SemanticAnalyzer>,
        pipeline_config,
    );

    let mut request = KeywordRequest::new(keyword);
    request.depth = depth.clamp(1, 10);
    request.seed_url = seed_url;
    request.locale = locale;

    let cancel = CancellationToken::new();
    let outcome = controller.run(&request, &cancel).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

async fn run_analyze_url(
    config: &AppConfig,
    pipeline_config: &PipelineConfig,
    url: &str,
) -> anyhow::Result<()> {
    let api = build_api(config, pipeline_config)?;
    let extractor = Extractor::new(Arc::clone(&api));
    let analyzer = Analyzer::new(
        Arc::clone(&api),
        &config.nlp_base_url,
        config.nlp_api_key.as_deref(),
    );

    let cancel = CancellationToken::new();
    let page = extractor.extract(url, &cancel).await?;
    let profile = analyzer.analyze(&page, &cancel).await?;
    let combined = serde_json::json!({ "page": page, "profile": profile });
    println!("{}", serde_json::to_string_pretty(&combined)?);
    Ok(())
}
