use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::services::profile_store::LoadPhase;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: ServiceHealth,
}

#[derive(Serialize)]
pub struct ServiceHealth {
    pub store: String,
    pub geocoding: String,
}

/// Health check endpoint
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let phase = state.store.phase();
    let geocoding = if state.geocoder.is_configured() {
        "ok"
    } else {
        "disabled"
    };

    // Without the store nothing works; without geocoding only the form suffers
    let status = match phase {
        LoadPhase::Failed(_) => "unhealthy",
        LoadPhase::Loading => "degraded",
        LoadPhase::Ready if !state.geocoder.is_configured() => "degraded",
        LoadPhase::Ready => "healthy",
    };

    let status_code = if status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services: ServiceHealth {
                store: state.store.status().state.to_string(),
                geocoding: geocoding.to_string(),
            },
        }),
    )
}

#[cfg(test)]
mod tests {
    use crate::app::{create_app, test_support::*, AppState};
    use crate::config::Settings;
    use crate::services::persistence::MemorySlot;
    use crate::services::{GeocodingClient, ProfileStore};
    use axum::http::StatusCode;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn ready_store_without_token_is_degraded() {
        let (state, _slot) = state_with(Vec::new()).await;

        let response = create_app(state)
            .oneshot(empty_request("GET", "/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = body_json(response).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["services"]["store"], "ready");
        assert_eq!(body["services"]["geocoding"], "disabled");
    }

    #[tokio::test]
    async fn failed_load_is_unhealthy() {
        let slot = Arc::new(MemorySlot::empty());
        slot.fail_reads(true);
        let store = ProfileStore::with_options(
            slot,
            crate::services::SeedSource::File("/nonexistent/seed.json".into()),
            std::time::Duration::ZERO,
        );
        store.load().await;

        let settings = Settings::for_tests();
        let geocoder = GeocodingClient::new(&settings.geocoding_url, None, 5).unwrap();
        let app = create_app(AppState::new(settings, store, geocoder));

        let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = body_json(response).await;
        assert_eq!(body["status"], "unhealthy");
    }
}
