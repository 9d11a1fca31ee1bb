use axum::{extract::DefaultBodyLimit, http::HeaderValue, middleware::from_fn, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Settings;
use crate::middleware::{echo_request_id, request_id_layer, request_span};
use crate::routes;
use crate::services::{DebounceSessions, GeocodingClient, MapView, ProfileStore};

/// Profile records are small; anything larger than this is not a profile.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state
pub struct AppState {
    pub settings: Settings,
    pub store: ProfileStore,
    pub geocoder: GeocodingClient,
    pub suggestion_sessions: DebounceSessions,
    pub map_view: MapView,
}

impl AppState {
    pub fn new(settings: Settings, store: ProfileStore, geocoder: GeocodingClient) -> Arc<Self> {
        let suggestion_sessions = DebounceSessions::new(
            Duration::from_millis(settings.geocoding_debounce_ms),
            Duration::from_secs(settings.geocoding_session_ttl_seconds),
        );

        Arc::new(Self {
            settings,
            store,
            geocoder,
            suggestion_sessions,
            map_view: MapView::new(),
        })
    }
}

/// Build the complete application with all middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.settings);

    // Spans at DEBUG keep INFO output to the application's own events
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(request_span::<axum::body::Body>)
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    let (set_request_id, propagate_request_id) = request_id_layer();

    Router::new()
        .merge(routes::api_router())
        // Middleware stack (applied bottom-up)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn(echo_request_id))
        .layer(propagate_request_id)
        .layer(trace_layer)
        .layer(set_request_id)
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    // Longer preflight cache while developing
    let max_age = if settings.env.is_dev() {
        Duration::from_secs(86400)
    } else {
        Duration::from_secs(3600)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::list([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::HeaderName::from_static("x-request-id"),
        ]))
        .expose_headers([
            axum::http::HeaderName::from_static("x-request-id"),
            axum::http::HeaderName::from_static(crate::api::response::PERSIST_WARNING_HEADER),
        ])
        .max_age(max_age)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::domain::profiles::Profile;
    use crate::services::persistence::MemorySlot;
    use axum::body::Body;
    use axum::http::Request;
    use axum::response::Response;
    use http_body_util::BodyExt;

    /// App state over an in-memory slot that already holds `profiles`.
    pub async fn state_with(profiles: Vec<Profile>) -> (Arc<AppState>, Arc<MemorySlot>) {
        let slot = Arc::new(MemorySlot::with_profiles(profiles));
        let store = ProfileStore::new(slot.clone());
        store.load().await;

        let settings = Settings::for_tests();
        let geocoder = GeocodingClient::new(&settings.geocoding_url, None, 5).unwrap();
        (AppState::new(settings, store, geocoder), slot)
    }

    pub async fn body_json<T: serde::de::DeserializeOwned>(resp: Response) -> T {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let (state, _slot) = state_with(Vec::new()).await;

        let response = create_app(state)
            .oneshot(empty_request("GET", "/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn client_request_id_is_echoed() {
        let (state, _slot) = state_with(Vec::new()).await;
        let mut request = empty_request("GET", "/health");
        request
            .headers_mut()
            .insert("x-request-id", "req-42".parse().unwrap());

        let response = create_app(state).oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn error_body_carries_the_request_id() {
        let (state, _slot) = state_with(Vec::new()).await;
        let mut request = empty_request("GET", "/profiles/nope");
        request
            .headers_mut()
            .insert("x-request-id", "req-42".parse().unwrap());

        let response = create_app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-request-id"], "req-42");

        let body: serde_json::Value = body_json(response).await;
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["message"], "Profile not found");
        assert_eq!(body["requestId"], "req-42");
    }

    #[tokio::test]
    async fn generated_request_id_matches_error_body() {
        let (state, _slot) = state_with(Vec::new()).await;

        let response = create_app(state)
            .oneshot(empty_request("GET", "/profiles/nope"))
            .await
            .unwrap();
        let header = response.headers()["x-request-id"]
            .to_str()
            .unwrap()
            .to_string();

        let body: serde_json::Value = body_json(response).await;
        assert_eq!(body["requestId"], header.as_str());
    }

    #[tokio::test]
    async fn success_bodies_are_left_alone() {
        let (state, _slot) = state_with(Vec::new()).await;

        let response = create_app(state)
            .oneshot(empty_request("GET", "/store/status"))
            .await
            .unwrap();
        let body: serde_json::Value = body_json(response).await;
        assert!(body.get("requestId").is_none());
        assert_eq!(body["data"]["state"], "ready");
    }
}
