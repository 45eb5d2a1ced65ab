// Main entry point for the text detection service

use textlens::{
    core::{config::Config, types::AppState},
    middleware::RateLimiter,
    server,
    services::TesseractEngine,
    utils::Metrics,
};

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Arc::new(Config::new().context("Failed to load configuration")?);

    // Initialize logging
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::new(format!(
        "textlens={}",
        match config.server.log_level {
            tracing::Level::TRACE => "trace",
            tracing::Level::DEBUG => "debug",
            tracing::Level::INFO => "info",
            tracing::Level::WARN => "warn",
            tracing::Level::ERROR => "error",
        }
    ));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Engine resolution runs once, before serving; failure is fatal
    let engine = match TesseractEngine::resolve(&config.engine) {
        Ok(engine) => Arc::new(engine),
        Err(err) => {
            error!("Tesseract OCR is not available: {err}");
            error!("Install it (https://github.com/tesseract-ocr/tesseract) or set TESSERACT_PATH");
            return Err(err.into());
        }
    };

    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit.max_requests,
        Duration::from_secs(config.rate_limit.window_seconds),
    ));
    let metrics = Metrics::new();

    let state = AppState {
        config: config.clone(),
        engine,
        limiter,
        metrics,
    };
    let app = server::router(state);

    let addr = config.bind_addr();
    info!("Server starting on http://{}", addr);
    info!(
        "Rate limit: {} requests / {}s per client",
        config.rate_limit.max_requests, config.rate_limit.window_seconds
    );
    info!("Endpoints:");
    info!("  GET  /api/health      - Health check");
    info!("  GET  /metrics         - Prometheus metrics");
    info!("  POST /api/detect-text - Detect text in an image");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
