//! Standard API response types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::profile_store::Committed;

/// Response wrapper with optional metadata
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data, meta: None }
    }

    pub fn with_meta(data: T, meta: serde_json::Value) -> Self {
        Self {
            data,
            meta: Some(meta),
        }
    }
}

impl<T: Serialize> From<Committed<T>> for ApiResponse<T> {
    /// A failed write-through is reported next to the data, not as an error.
    fn from(committed: Committed<T>) -> Self {
        match committed.persist_warning {
            Some(warning) => Self::with_meta(
                committed.value,
                serde_json::json!({ "persistWarning": warning }),
            ),
            None => Self::new(committed.value),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Response for single data item
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for DataResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// 201 with the given body
pub struct Created<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

/// 204, optionally carrying a persistence warning header
pub struct NoContent {
    pub persist_warning: Option<String>,
}

impl IntoResponse for NoContent {
    fn into_response(self) -> Response {
        let mut response = StatusCode::NO_CONTENT.into_response();
        if let Some(value) = self
            .persist_warning
            .and_then(|w| axum::http::HeaderValue::from_str(&w).ok())
        {
            response.headers_mut().insert(PERSIST_WARNING_HEADER, value);
        }
        response
    }
}

pub const PERSIST_WARNING_HEADER: &str = "x-persist-warning";
