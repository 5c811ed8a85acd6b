//! Shared-secret check for internal routes.

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

use crate::AppState;

/// Header carrying the internal token.
pub const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";

/// Rejects requests whose `x-internal-token` does not match the configured
/// secret. With no secret configured every request is rejected.
pub async fn internal_token_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(INTERNAL_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok());

    let Some(provided) = provided else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "missing_token",
                "message": "x-internal-token header is required"
            })),
        )
            .into_response();
    };

    if state
        .internal_token
        .as_deref()
        .is_some_and(|expected| tokens_match(expected.as_bytes(), provided.as_bytes()))
    {
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Rejected internal request");
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "invalid_token",
            "message": "Invalid internal token"
        })),
    )
        .into_response()
}

/// Compares tokens in time that depends only on their lengths.
fn tokens_match(expected: &[u8], provided: &[u8]) -> bool {
    if expected.len() != provided.len() {
        return false;
    }
    expected
        .iter()
        .zip(provided)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}
