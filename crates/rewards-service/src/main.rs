//! Rewards Service - HTTP API for referrals, coins, and bonuses
//!
//! This is the main entry point for the rewards service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rewards_service::{create_router, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rewards=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Rewards Service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage_backend,
        data_dir = %config.data_dir,
        public_origin = %config.public_origin,
        auth_base_url = %config.auth_base_url,
        "Service configuration loaded"
    );

    let store = AppState::open_store(&config)?;
    let state = AppState::new(store, config.clone());

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
