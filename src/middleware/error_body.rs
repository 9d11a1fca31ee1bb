//! Request id echo for JSON error bodies

use axum::{extract::Request, middleware::Next, response::IntoResponse, response::Response, Json};

use super::request_id::RequestIdExt;
use crate::error::ErrorResponse;

/// Copies the request's `x-request-id` into the body of any `ApiError`
/// response. Other responses pass through untouched.
pub async fn echo_request_id(request: Request, next: Next) -> Response {
    let request_id = request.headers().request_id().map(str::to_owned);
    let mut response = next.run(request).await;

    let Some(mut body) = response.extensions_mut().remove::<ErrorResponse>() else {
        return response;
    };
    let Some(request_id) = request_id else {
        return response;
    };

    body.request_id = Some(request_id);
    let (parts, _) = response.into_parts();
    (parts, Json(body)).into_response()
}
