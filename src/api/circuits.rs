//! Circuit breaker inspection and reset.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::API_PREFIX;
use crate::http::error::ApiError;
use crate::http::response::{encode_query_value, Link, Links, LinksBuilder};
use crate::http::server::AppState;
use crate::resilience::CircuitStatus;

#[derive(Debug, Serialize, Deserialize)]
pub struct CircuitView {
    #[serde(flatten)]
    pub status: CircuitStatus,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl From<CircuitStatus> for CircuitView {
    fn from(status: CircuitStatus) -> Self {
        let links = LinksBuilder::new(format!(
            "{}/circuits/status?path={}",
            API_PREFIX,
            encode_query_value(&status.path)
        ))
        .link("collection", Link::get(format!("{}/circuits", API_PREFIX)))
        .link(
            "reset",
            Link::with_method(format!("{}/circuits/reset", API_PREFIX), "POST"),
        )
        .build();
        Self { status, links }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CircuitList {
    pub items: Vec<CircuitView>,
    pub total: usize,
    #[serde(rename = "_links")]
    pub links: Links,
}

#[derive(Debug, Deserialize)]
pub struct CircuitPathQuery {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetCircuitRequest {
    pub path: String,
}

fn validate_path(path: &str) -> Result<&str, ApiError> {
    let path = path.trim();
    if !path.starts_with('/') {
        return Err(ApiError::Validation(format!(
            "path '{}' must start with '/'",
            path
        )));
    }
    Ok(path)
}

pub async fn list_circuits(State(state): State<AppState>) -> Json<CircuitList> {
    let items: Vec<CircuitView> = state
        .circuit_breaker
        .statuses()
        .await
        .into_iter()
        .map(CircuitView::from)
        .collect();
    Json(CircuitList {
        total: items.len(),
        items,
        links: LinksBuilder::new(format!("{}/circuits", API_PREFIX)).build(),
    })
}

pub async fn circuit_status(
    State(state): State<AppState>,
    query: Result<Query<CircuitPathQuery>, QueryRejection>,
) -> Result<Json<CircuitView>, ApiError> {
    let Query(query) = query?;
    let path = validate_path(&query.path)?;
    Ok(Json(state.circuit_breaker.status(path).await.into()))
}

pub async fn reset_circuit(
    State(state): State<AppState>,
    body: Result<Json<ResetCircuitRequest>, JsonRejection>,
) -> Result<Json<CircuitView>, ApiError> {
    let Json(request) = body?;
    let path = validate_path(&request.path)?;
    Ok(Json(state.circuit_breaker.reset(path).await.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::{CircuitState, StateSource};

    #[test]
    fn test_validate_path() {
        assert_eq!(validate_path(" /api/v1/events ").unwrap(), "/api/v1/events");
        assert!(validate_path("api/v1").is_err());
        assert!(validate_path("").is_err());
    }

    #[test]
    fn test_circuit_view_links() {
        let view = CircuitView::from(CircuitStatus {
            path: "/api/v1/events".into(),
            state: CircuitState::Open,
            failure_count: 5,
            last_failure_at: None,
            failure_threshold: 5,
            recovery_timeout_ms: 30_000,
            backend: StateSource::Local,
        });
        assert_eq!(
            view.links["self"].href,
            "/api/v1/circuits/status?path=%2Fapi%2Fv1%2Fevents"
        );
        assert_eq!(view.links["reset"].method.as_deref(), Some("POST"));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["state"], "OPEN");
        assert_eq!(json["backend"], "local");
    }
}
