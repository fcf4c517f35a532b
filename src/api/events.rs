//! Event dispatch endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::API_PREFIX;
use crate::http::error::ApiError;
use crate::http::response::{Link, Links, LinksBuilder};
use crate::http::server::AppState;
use crate::webhooks::DispatchReport;

#[derive(Debug, Deserialize)]
pub struct EmitEventRequest {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DispatchView {
    #[serde(flatten)]
    pub report: DispatchReport,
    #[serde(rename = "_links")]
    pub links: Links,
}

/// Fan `event` out to its subscribers and report every outcome.
pub async fn emit_event(
    State(state): State<AppState>,
    body: Result<Json<EmitEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DispatchView>), ApiError> {
    let Json(request) = body?;
    let event = request.event.trim();
    let report = state.dispatcher.dispatch(event, request.data).await?;

    let links = LinksBuilder::new(format!("{}/events", API_PREFIX))
        .link("webhooks", Link::get(format!("{}/webhooks", API_PREFIX)))
        .build();
    Ok((StatusCode::ACCEPTED, Json(DispatchView { report, links })))
}
