//! profile-atlas server entry point.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use profile_atlas::services::persistence::MemorySlot;
use profile_atlas::services::{
    GeocodingClient, JsonFileSlot, ProfileSlot, ProfileStore, SeedSource,
};
use profile_atlas::{app, config, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting profile atlas"
    );

    // Profile store over the JSON file slot, seeded on first run
    let http = reqwest::Client::builder()
        .build()
        .context("Failed to create HTTP client")?;
    let seed = SeedSource::from_location(
        &settings.seed_data,
        http,
        Duration::from_secs(settings.seed_fetch_timeout_seconds),
    );
    let slot: Arc<dyn ProfileSlot> = if settings.profiles_store_path.as_os_str().is_empty() {
        tracing::warn!("PROFILES_STORE_PATH is empty, profiles will not survive a restart");
        Arc::new(MemorySlot::empty())
    } else {
        Arc::new(JsonFileSlot::new(&settings.profiles_store_path))
    };
    let store = ProfileStore::with_options(
        slot,
        seed,
        Duration::from_millis(settings.persist_retry_max_elapsed_ms),
    );

    // Load in the background; mutations answer 503 until it finishes
    tokio::spawn({
        let store = store.clone();
        async move {
            store.load().await;
            tracing::info!(status = ?store.status(), "Profile store load finished");
        }
    });

    // Create geocoding client
    let geocoder = GeocodingClient::new(
        &settings.geocoding_url,
        settings.mapbox_token.clone(),
        settings.geocoding_timeout_seconds,
    )?;

    // Optionally check geocoding service health (non-blocking)
    if geocoder.is_configured() {
        tokio::spawn({
            let geocoder = geocoder.clone();
            async move {
                match geocoder.health_check().await {
                    Ok(()) => tracing::info!("Geocoding service is healthy"),
                    Err(e) => tracing::warn!(error = %e, "Geocoding health check failed - suggestions may be empty"),
                }
            }
        });
    }

    // Create application state
    let server_addr = settings.server_addr.clone();
    let state = app::AppState::new(settings, store, geocoder);

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind {server_addr}"))?;
    tracing::info!("Listening on {}", server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
