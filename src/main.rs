#![allow(clippy::result_large_err)]

use container_market::{
    api::{self, AppState},
    config::{self, AppConfig, Secrets},
    core::{
        catalog,
        geo::Geocoder,
        tracking::{DemoTracker, TrackingProvider, UnconfiguredTracker},
    },
    errors::Result,
    outbound::{GoogleGeocoder, ShipsgoClient},
};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn build_geocoder(config: &AppConfig, secrets: &Secrets) -> Result<Option<Arc<dyn Geocoder>>> {
    let Some(key) = secrets.google_maps_api_key.clone() else {
        warn!("GOOGLE_MAPS_API_KEY not set: postal code distance search and surcharges are off");
        return Ok(None);
    };
    let geocoder = GoogleGeocoder::new(&config.geocoding, key)?;
    Ok(Some(Arc::new(geocoder)))
}

fn build_tracker(config: &AppConfig, secrets: &Secrets) -> Result<Arc<dyn TrackingProvider>> {
    match secrets.shipsgo_api_key.clone() {
        Some(key) => Ok(Arc::new(ShipsgoClient::new(&config.tracking, key)?)),
        None if config.tracking.demo_mode => {
            warn!("SHIPSGO_API_KEY not set: serving demo tracking data");
            Ok(Arc::new(DemoTracker))
        }
        None => {
            warn!("SHIPSGO_API_KEY not set: tracking requests will be rejected");
            Ok(Arc::new(UnconfiguredTracker))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the main application configuration
    let app_config = config::app::load_app_configuration()
        .inspect_err(|e| error!("Failed to load application configuration: {e}"))?;
    let secrets = Secrets::from_env();

    // 4. Initialize database and schema
    let db_url = config::database::get_database_url();
    if db_url.starts_with("sqlite://data/") {
        std::fs::create_dir_all("data")?;
    }
    let db = config::database::create_connection()
        .await
        .inspect(|_| info!("Connected to database"))
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    config::database::create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Seed depots and listings from config
    catalog::seed_catalog(&db, &app_config)
        .await
        .inspect_err(|e| error!("Failed to seed catalog: {e}"))?;

    // 6. Serve the API
    let state = AppState {
        db,
        geocoder: build_geocoder(&app_config, &secrets)?,
        tracker: build_tracker(&app_config, &secrets)?,
        config: Arc::new(app_config),
    };
    let bind_addr = state.config.server.bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .inspect_err(|e| error!("Failed to bind {bind_addr}: {e}"))?;
    info!("Listening on {bind_addr}");

    axum::serve(listener, api::router(state)).await?;
    Ok(())
}
