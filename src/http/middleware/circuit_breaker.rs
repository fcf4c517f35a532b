//! Circuit breaker middleware.
//!
//! # Responsibilities
//! - Refuse requests on guarded paths whose circuit is open (503 + Retry-After)
//! - Report each completed request: 5xx or a request timeout (408) is a
//!   failure, anything else a success
//!
//! # Design Decisions
//! - Sees the full request path (installed outside the nested API router)
//! - Installed outside the timeout layer so overrunning requests are counted
//! - Rejections produced here are not reported back to the breaker
//! - Circuit administration is never guarded, so a reset is always reachable

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::ApiError;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::resilience::circuit_breaker::path_has_prefix;

const UNGUARDED_PREFIX: &str = "/api/v1/circuits";

pub async fn circuit_breaker_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let config = state.config();
    let cb = &config.circuit_breaker;
    let path = request.uri().path().to_string();

    let guarded = !path_has_prefix(&path, UNGUARDED_PREFIX)
        && cb.guarded_prefixes.iter().any(|p| path_has_prefix(&path, p));
    if !cb.enabled || !guarded {
        return next.run(request).await;
    }

    let breaker = &state.circuit_breaker;
    if !breaker.is_service_available(&path).await {
        let policy = breaker.policy_for(&path);
        tracing::warn!(
            request_id = %request_id(&request),
            path = %path,
            circuit = %policy.key,
            "Circuit open, rejecting request"
        );
        let recovery_ms = policy.recovery_timeout.as_millis() as u64;
        return ApiError::ServiceUnavailable {
            message: format!("service temporarily unavailable: circuit for {} is open", policy.key),
            retry_after_secs: recovery_ms.div_ceil(1000).max(1),
        }
        .into_response();
    }

    let response = next.run(request).await;
    let status = response.status();
    if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        breaker.record_failure(&path).await;
    } else {
        breaker.record_success(&path).await;
    }
    response
}
