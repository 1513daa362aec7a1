use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use linkcore::clock::SystemClock;
use linkcore::config::Config;
use linkcore::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    let state = Arc::new(AppState::new(&config, Arc::new(SystemClock)));
    info!(
        "🚦 Rate limit: {} requests per {}s per client ({:?})",
        config.rate_limit.limit, config.rate_limit.window_secs, config.client_key
    );

    let sweeper = state.start_sweeper();
    info!(
        "🧹 Expiration sweeper running every {}s",
        config.expiration.sweep_interval_secs
    );

    let app = linkcore::create_app(Arc::clone(&state));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("🚀 URL shortener listening on http://{}", addr);
    info!("   - Short links served as {}/<code>", config.base_url);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.shutdown().await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
