//! The currently selected profile, shared by the directory and the map.

use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::DataResponse;
use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    #[serde(default)]
    pub id: Option<String>,
}

/// GET /selection
pub async fn get_selection(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    DataResponse::new(state.store.selected())
}

/// PUT /selection
pub async fn set_selection(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let selected = state.store.select(req.id.as_deref())?;
    state
        .map_view
        .sync_selection(selected.as_ref().map(|p| p.id.as_str()));

    Ok(DataResponse::new(selected))
}

/// DELETE /selection
pub async fn clear_selection(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.select(None)?;
    state.map_view.sync_selection(None);

    Ok(DataResponse::new(None::<crate::domain::Profile>))
}

#[cfg(test)]
mod tests {
    use crate::app::{create_app, test_support::*};
    use crate::domain::profiles::fixtures::profile;
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    #[tokio::test]
    async fn select_then_clear() {
        let (state, _slot) = state_with(vec![profile("1", "Ann", "Surveyor", "Boston")]).await;
        let app = create_app(state);

        let body: Value = body_json(
            app.clone()
                .oneshot(json_request("PUT", "/selection", json!({"id": "1"})))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["data"]["name"], "Ann");

        let body: Value = body_json(
            app.clone()
                .oneshot(empty_request("GET", "/selection"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["data"]["id"], "1");

        let body: Value = body_json(
            app.clone()
                .oneshot(json_request("PUT", "/selection", json!({"id": null})))
                .await
                .unwrap(),
        )
        .await;
        assert!(body["data"].is_null());

        app.clone()
            .oneshot(json_request("PUT", "/selection", json!({"id": "1"})))
            .await
            .unwrap();
        let response = app
            .clone()
            .oneshot(empty_request("DELETE", "/selection"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = body_json(app.oneshot(empty_request("GET", "/selection")).await.unwrap()).await;
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn selecting_unknown_id_is_404() {
        let (state, _slot) = state_with(Vec::new()).await;

        let response = create_app(state)
            .oneshot(json_request("PUT", "/selection", json!({"id": "ghost"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
