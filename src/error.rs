//! Error types
//!
//! `ProfileError` is what the store and form report; `ApiError` maps it
//! (and anything else a handler can hit) onto consistent JSON responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures of profile store and admin form operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Neither the persisted slot nor the seed dataset could be read.
    #[error("Failed to load profiles: {0}")]
    Load(String),

    /// A required field or the coordinate pair is missing or malformed.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// A mutation arrived before `load()` completed.
    #[error("Profiles are still loading")]
    NotReady,
}

impl ProfileError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn profile_not_found(id: &str) -> Self {
        tracing::debug!(profile_id = id, "Profile lookup missed");
        Self::NotFound("Profile not found".to_string())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

/// JSON error body. The request id is filled in by
/// [`crate::middleware::echo_request_id`], which finds the body in the
/// response extensions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "VALIDATION_ERROR",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::NotFound(msg) | Self::BadRequest(msg) | Self::Unavailable(msg) => msg.clone(),
            // Don't leak internal error details
            Self::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::Validation(msg) => Self::BadRequest(msg),
            ProfileError::NotFound(msg) => Self::NotFound(msg),
            ProfileError::NotReady => Self::Unavailable(err.to_string()),
            ProfileError::Load(_) => Self::Unavailable(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = ?e, "Internal server error");
            }
            _ => {
                tracing::warn!(error = %self, "API error");
            }
        }

        let status = self.status_code();
        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.public_message(),
            request_id: None,
        };

        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_errors_map_to_http_statuses() {
        let cases = [
            (ProfileError::validation("Name is required"), StatusCode::BAD_REQUEST),
            (ProfileError::profile_not_found("42"), StatusCode::NOT_FOUND),
            (ProfileError::NotReady, StatusCode::SERVICE_UNAVAILABLE),
            (ProfileError::Load("disk".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = ApiError::Internal(anyhow::anyhow!("secret path /var/lib/x"));
        assert_eq!(err.public_message(), "An internal error occurred");
    }

    #[test]
    fn error_body_is_stashed_for_the_request_id_echo() {
        let response = ApiError::from(ProfileError::NotReady).into_response();

        let body = response.extensions().get::<ErrorResponse>().unwrap();
        assert_eq!(body.code, "UNAVAILABLE");
        assert_eq!(body.request_id, None);
    }
}
