//! Address autocompletion
//!
//! Each address input sends its keystrokes with a `session` id. Lookups in
//! one session are debounced and only the latest query gets suggestions;
//! older requests come back empty with `superseded: true`. A session is
//! required: without one, unrelated inputs would supersede each other.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::ApiResponse;
use crate::app::AppState;
use crate::error::ApiError;
use crate::services::debounce::Debounced;

#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub session: Option<String>,
}

/// GET /geocode/suggest
pub async fn suggest(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SuggestQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let session = query
        .session
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("session is required".to_string()))?;
    let debouncer = state.suggestion_sessions.session(session);

    let (suggestions, superseded) = match state
        .geocoder
        .suggest_debounced(&debouncer, &query.q)
        .await
    {
        Debounced::Fresh(suggestions) => (suggestions, false),
        Debounced::Superseded | Debounced::Stale => (Vec::new(), true),
    };

    Ok(ApiResponse::with_meta(
        suggestions,
        serde_json::json!({ "superseded": superseded }),
    ))
}
