//! Map scene routes
//!
//! The scene tells a renderer what to draw. When the selection changes the
//! scene key moves on and the renderer is expected to rebuild its map and
//! then report back through `POST /map/ready`.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::DataResponse;
use crate::app::AppState;
use crate::domain::ProfileFilter;
use crate::error::ApiError;
use crate::services::map_view::{LatLng, MapTheme, MAX_ZOOM};

#[derive(Debug, Default, Deserialize)]
pub struct SceneQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub theme: MapTheme,
}

#[derive(Debug, Deserialize)]
pub struct ReadyRequest {
    pub key: u64,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub center: LatLng,
    pub zoom: u8,
}

#[derive(Debug, Serialize)]
pub struct SurfaceKey {
    pub key: u64,
    pub ready: bool,
}

/// GET /map
pub async fn get_scene(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SceneQuery>,
) -> impl IntoResponse {
    let filter = ProfileFilter::new(query.search, query.location);
    let view = state.store.view(&filter);

    DataResponse::new(state.map_view.render(&view, query.theme))
}

/// POST /map/ready
///
/// A key that is no longer current is acknowledged with `ready: false`.
pub async fn mark_ready(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReadyRequest>,
) -> impl IntoResponse {
    let ready = state.map_view.mark_ready(req.key);
    if !ready {
        tracing::debug!(key = req.key, "Ignoring ready signal for stale map key");
    }

    DataResponse::new(SurfaceKey {
        key: state.map_view.key(),
        ready,
    })
}

/// POST /map/reset
pub async fn reset_view(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let LatLng {
        latitude,
        longitude,
    } = req.center;
    crate::domain::profiles::validate_coordinates(Some(latitude), Some(longitude))?;
    if req.zoom > MAX_ZOOM {
        return Err(ApiError::BadRequest(format!(
            "zoom must be between 0 and {MAX_ZOOM}"
        )));
    }

    let key = state.map_view.reset(req.center, req.zoom);
    Ok(DataResponse::new(SurfaceKey { key, ready: false }))
}
