use anyhow::Context;
use pharmacy_orders::config::Config;
use pharmacy_orders::router::create_app_router;
use pharmacy_orders::session::AppState;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up a local .env before reading the configuration
    dotenvy::dotenv().ok();

    // Default to INFO, overridable with RUST_LOG
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pharmacy_orders=debug")),
        )
        .init();

    let config = Config::from_env().context("Invalid configuration")?;
    let addr = config.bind_addr;
    tracing::info!(
        %addr,
        stage_interval_secs = config.stage_interval.as_secs(),
        default_delivery_fee = %config.default_delivery_fee,
        "Starting pharmacy orders service"
    );

    // Initialize application state
    let state = Arc::new(AppState::with_config(config));

    // Build application router with all routes and middleware
    let app = create_app_router(state);

    // Start the server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Server running on http://{}", addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
