use axum::{extract::State, response::IntoResponse};
use std::sync::Arc;

use crate::api::DataResponse;
use crate::app::AppState;

/// GET /store/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    DataResponse::new(state.store.status())
}
