//! Parcel Fertility Analysis - Backend Server
//!
//! Serves zone-level fertility maps and NPK recommendations for farm parcels.

use std::net::SocketAddr;

use parcel_fertility_backend::{config::Config, create_app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pfa_server=debug,parcel_fertility_backend=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Parcel Fertility Analysis Server");
    tracing::info!("Environment: {}", config.environment);
    if config.sentinel_hub.credentials().is_none() {
        tracing::warn!("Sentinel Hub credentials not configured; all analyses will use simulated data");
    }

    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(host, config.server.port);

    // Create application state
    let state = AppState::new(config)?;

    // Build application
    let app = create_app(state);

    // Start server
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
