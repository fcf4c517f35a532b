//! API key authentication.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};

use crate::http::error::ApiError;
use crate::http::request::request_id;
use crate::http::server::AppState;

/// Require `Authorization: Bearer <api_key>` when auth is enabled.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let config = state.config();
    if !config.api.auth_enabled {
        return Ok(next.run(request).await);
    }

    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(key) if keys_match(key, &config.api.api_key) => Ok(next.run(request).await),
        _ => {
            tracing::warn!(
                request_id = %request_id(&request),
                path = %request.uri().path(),
                "Rejected request with missing or invalid API key"
            );
            Err(ApiError::Unauthorized)
        }
    }
}

/// Length-then-content comparison that does not stop at the first mismatch.
fn keys_match(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
