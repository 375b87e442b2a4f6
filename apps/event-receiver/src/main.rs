use axum_helpers::server::{create_production_app, create_router, health_router};
use axum_helpers::create_cors_layer;
use core_config::tracing::{init_tracing, install_color_eyre};
use database::couchdb::CouchDbStore;
use std::time::Duration;
use tracing::{info, warn};

mod api;
mod config;
mod openapi;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    init_tracing(&config.environment);
    info!(
        app = config.app.name,
        version = config.app.version,
        "Starting event receiver"
    );

    info!(
        "Using CouchDB at {} (database: {})",
        config.couchdb.url(),
        config.couchdb.database()
    );
    let store = CouchDbStore::new(&config.couchdb)?;

    // Liveness never depends on the store, so an unreachable store is not fatal here
    match store.ensure_database().await {
        Ok(true) => info!(database = config.couchdb.database(), "Created database"),
        Ok(false) => info!(database = config.couchdb.database(), "Database already exists"),
        Err(e) => warn!(error = %e, "Unable to ensure database exists"),
    }

    let cors = config
        .cors_origins
        .as_deref()
        .map(create_cors_layer)
        .transpose()?;

    let api_routes = api::routes(store, config.env_snapshot.clone()).merge(health_router());
    let app = create_router::<openapi::ApiDoc>(api_routes, cors);

    info!("Starting event receiver with graceful shutdown (30s timeout)");

    create_production_app(app, &config.server, Duration::from_secs(30), async move {
        info!("Shutting down: releasing CouchDB client");
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Event receiver shutdown complete");
    Ok(())
}
