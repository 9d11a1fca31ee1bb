pub mod geocode;
pub mod health;
pub mod map;
pub mod profiles;
pub mod selection;
pub mod store;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        // Profiles
        .route(
            "/profiles",
            get(profiles::list_profiles).post(profiles::create_profile),
        )
        .route(
            "/profiles/:profile_id",
            get(profiles::get_profile)
                .put(profiles::update_profile)
                .delete(profiles::delete_profile),
        )
        // Selection
        .route(
            "/selection",
            get(selection::get_selection)
                .put(selection::set_selection)
                .delete(selection::clear_selection),
        )
        // Map
        .route("/map", get(map::get_scene))
        .route("/map/ready", post(map::mark_ready))
        .route("/map/reset", post(map::reset_view))
        // Store
        .route("/store/status", get(store::get_status))
        // Address autocompletion
        .route("/geocode/suggest", get(geocode::suggest))
}
