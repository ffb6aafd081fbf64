use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::GlobalKeyExtractor, GovernorLayer,
};
use tracing::{info, warn};

use tts_core::OpenAiSpeechClient;
use tts_relay::{build_router, config::ServerConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    async_main().await
}

async fn async_main() -> anyhow::Result<()> {
    info!("Starting TTS relay...");

    let config = ServerConfig::from_env();
    let api_key = config
        .openai_api_key
        .clone()
        .context("OPENAI_API_KEY must be set in the environment")?;
    let provider = OpenAiSpeechClient::new(api_key, config.speech_options())?
        .with_base_url(config.openai_base_url.clone());

    info!(
        "Server configuration loaded: port={}, chunk_size={}, chunk_delay={}ms, cleanup_delay={}ms, artifacts in {}",
        config.port,
        config.chunk_size,
        config.chunk_delay_ms,
        config.cleanup_delay_ms,
        config.artifact_dir.display()
    );
    if config.cors_allowed_origins.is_none() {
        warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins");
    }

    let state = AppState::new(Arc::new(provider), config.clone());
    let shutdown = state.shutdown.clone();

    // Global limit: all clients share one bucket, refilled evenly over the minute.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond((60_000 / u64::from(config.rate_limit_per_minute)).max(1))
            .burst_size(config.rate_limit_per_minute)
            .key_extractor(GlobalKeyExtractor)
            .finish()
            .context("invalid rate limit configuration")?,
    );
    info!("Rate limiting: {} requests per minute", config.rate_limit_per_minute);

    let app = build_router(state).layer(GovernorLayer::new(governor_conf));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {addr}: {e}. Try a different PORT."))?;

    info!("Server listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;
    info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl-C and cancel every in-flight stream.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested, cancelling in-flight streams");
    shutdown.cancel();
}
