use std::net::SocketAddr;
use std::sync::Arc;

use giveflow_backend::api::{self, AppState};
use giveflow_backend::config::Config;
use giveflow_backend::database::repository::PgDonationStore;
use giveflow_backend::database::{self, PoolConfig};
use giveflow_backend::donations::DonationService;
use giveflow_backend::payments::providers::LencoProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;

    // Log startup info
    tracing::info!("Starting GiveFlow Backend");
    tracing::info!("Environment: {}", config.server.environment);
    tracing::info!("Donation currency: {}", config.donations.currency);
    tracing::info!("Lenco base URL: {}", config.lenco.base_url);

    // Connect to the donation store
    let pool = database::init_pool(
        &config.database.url,
        Some(PoolConfig {
            max_connections: config.database.max_connections,
            ..Default::default()
        }),
    )
    .await?;

    // Wire the donation flows: gateway and store are injected values, not
    // process-wide singletons
    let gateway = Arc::new(LencoProvider::new(config.lenco.clone()));
    let store = Arc::new(PgDonationStore::new(pool));
    let service = Arc::new(DonationService::new(
        gateway,
        store,
        config.donations.currency.clone(),
        config.callback_url(),
    ));

    // Build router
    let app = api::router(AppState {
        config: config.clone(),
        service,
    });

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
