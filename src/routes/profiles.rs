//! Profile routes
//!
//! Directory listing and the admin create/edit/delete endpoints. Writes go
//! through `ProfileForm` so the HTTP surface enforces the same rules as the
//! admin form.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::api::{ApiResponse, Created, DataResponse, NoContent};
use crate::app::AppState;
use crate::domain::{FormMode, ProfileDraft, ProfileFilter, ProfileForm};
use crate::error::ApiError;

/// GET /profiles
pub async fn list_profiles(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ProfileFilter>,
) -> impl IntoResponse {
    DataResponse::new(state.store.list(&filter))
}

/// GET /profiles/:profile_id
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.store.get(&profile_id)?;
    Ok(DataResponse::new(profile))
}

/// POST /profiles
pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ProfileDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = ProfileForm::from_input(FormMode::Create, draft);
    let committed = form.submit(&state.store).await?;

    tracing::info!(profile_id = %committed.value.id, "Profile created");

    Ok(Created(ApiResponse::from(committed)))
}

/// PUT /profiles/:profile_id
///
/// The path decides which record is replaced; an `id` in the body is ignored.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<String>,
    Json(draft): Json<ProfileDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = ProfileForm::from_input(FormMode::Edit { id: profile_id }, draft);
    let committed = form.submit(&state.store).await?;

    Ok(ApiResponse::from(committed))
}

/// DELETE /profiles/:profile_id
///
/// Deleting an id that is not there still answers 204.
pub async fn delete_profile(
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let committed = state.store.remove(&profile_id).await?;

    if committed.value {
        let selected = state.store.selected();
        state
            .map_view
            .sync_selection(selected.as_ref().map(|p| p.id.as_str()));
    }

    Ok(NoContent {
        persist_warning: committed.persist_warning,
    })
}
