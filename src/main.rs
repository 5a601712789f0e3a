//! Sentiment Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring config, collaborators, the analysis
//! engine and the progress log consumer.

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crypto_sentiment_analyzer::api::{self, AppState};
use crypto_sentiment_analyzer::config::AppConfig;
use crypto_sentiment_analyzer::engine::Engine;
use crypto_sentiment_analyzer::metrics::Metrics;
use crypto_sentiment_analyzer::progress::ProgressSink;
use crypto_sentiment_analyzer::providers::openrouter::OpenRouterClient;
use crypto_sentiment_analyzer::providers::search_api::SearchApiProvider;
use crypto_sentiment_analyzer::providers::{DynAnalysisClient, DynPostSource};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load_or_default("config/analyzer.json");
    let metrics = Metrics::init();

    let source: DynPostSource = Arc::new(SearchApiProvider::new(&cfg.search));
    let analysis: DynAnalysisClient = Arc::new(OpenRouterClient::new(&cfg.analysis));

    // Progress events go to the structured log by default; a dashboard can
    // subscribe to the same channel instead.
    let (progress, mut events) = ProgressSink::channel();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            tracing::info!(target: "progress", ?event, "pipeline progress");
        }
    });

    let engine = Arc::new(Engine::new(source, analysis, progress));
    let app = api::create_router(AppState {
        engine,
        window_defaults: cfg.window,
    })
    .merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!(addr = %cfg.bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
