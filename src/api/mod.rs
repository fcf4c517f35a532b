//! REST API (`/api/v1`).
//!
//! # Resources
//! ```text
//! /webhooks                    list, register
//! /webhooks/{id}               fetch, update, delete
//! /webhooks/{id}/deliveries    delivery log
//! /webhooks/{id}/test          send webhook.test
//! /events                      dispatch a domain event
//! /circuits                    circuit statuses
//! /circuits/status?path=       one circuit
//! /circuits/reset              force a circuit closed
//! ```

pub mod circuits;
pub mod events;
pub mod webhooks;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use serde::Deserialize;

use crate::config::ApiConfig;
use crate::http::error::ApiError;
use crate::http::middleware::require_api_key;
use crate::http::server::AppState;

pub const API_PREFIX: &str = "/api/v1";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhooks", get(webhooks::list_webhooks).post(webhooks::create_webhook))
        .route(
            "/webhooks/{id}",
            get(webhooks::get_webhook)
                .put(webhooks::update_webhook)
                .delete(webhooks::delete_webhook),
        )
        .route("/webhooks/{id}/deliveries", get(webhooks::list_deliveries))
        .route("/webhooks/{id}/test", post(webhooks::test_webhook))
        .route("/events", post(events::emit_event))
        .route("/circuits", get(circuits::list_circuits))
        .route("/circuits/status", get(circuits::circuit_status))
        .route("/circuits/reset", post(circuits::reset_circuit))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}

/// `skip` / `limit` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

impl Pagination {
    /// Apply defaults and clamp `limit` to the configured maximum.
    pub fn resolve(&self, config: &ApiConfig) -> Result<(usize, usize), ApiError> {
        let limit = self.limit.unwrap_or(config.default_page_size);
        if limit == 0 {
            return Err(ApiError::Validation("limit must be greater than 0".into()));
        }
        Ok((self.skip.unwrap_or(0), limit.min(config.max_page_size)))
    }
}
