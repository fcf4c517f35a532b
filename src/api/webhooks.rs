//! Webhook registration and delivery log handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{Pagination, API_PREFIX};
use crate::http::error::ApiError;
use crate::http::response::{Link, Links, LinksBuilder, Page};
use crate::http::server::AppState;
use crate::webhooks::{NewWebhook, Webhook, WebhookDelivery, WebhookUpdate};

pub(crate) fn webhook_href(id: Uuid) -> String {
    format!("{}/webhooks/{}", API_PREFIX, id)
}

fn webhook_links(id: Uuid) -> Links {
    let href = webhook_href(id);
    LinksBuilder::new(href.clone())
        .link("collection", Link::get(format!("{}/webhooks", API_PREFIX)))
        .link("deliveries", Link::get(format!("{}/deliveries", href)))
        .link("test", Link::with_method(format!("{}/test", href), "POST"))
        .link("update", Link::with_method(href.clone(), "PUT"))
        .link("delete", Link::with_method(href, "DELETE"))
        .build()
}

/// Webhook as exposed by the API. The secret itself is never returned.
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookView {
    pub id: Uuid,
    pub url: String,
    pub events: Vec<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub has_secret: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl From<Webhook> for WebhookView {
    fn from(hook: Webhook) -> Self {
        Self {
            links: webhook_links(hook.id),
            id: hook.id,
            url: hook.url,
            events: hook.events,
            description: hook.description,
            is_active: hook.is_active,
            has_secret: hook.secret.is_some(),
            created_at: hook.created_at,
            updated_at: hook.updated_at,
        }
    }
}

/// Delivery log entry with links back to its webhook.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeliveryView {
    #[serde(flatten)]
    pub delivery: WebhookDelivery,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl From<WebhookDelivery> for DeliveryView {
    fn from(delivery: WebhookDelivery) -> Self {
        let hook = webhook_href(delivery.webhook_id);
        let links = LinksBuilder::new(format!("{}/deliveries", hook))
            .link("webhook", Link::get(hook))
            .build();
        Self { delivery, links }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListWebhooksQuery {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    pub active: Option<bool>,
}

pub async fn list_webhooks(
    State(state): State<AppState>,
    query: Result<Query<ListWebhooksQuery>, QueryRejection>,
) -> Result<Json<Page<WebhookView>>, ApiError> {
    let Query(query) = query?;
    let (skip, limit) = Pagination {
        skip: query.skip,
        limit: query.limit,
    }
    .resolve(&state.config().api)?;

    let (hooks, total) = state.dispatcher.registry().list(skip, limit, query.active);
    let extra: Vec<(&str, String)> = query
        .active
        .map(|a| vec![("active", a.to_string())])
        .unwrap_or_default();

    Ok(Json(Page::new(
        hooks.into_iter().map(WebhookView::from).collect(),
        total,
        skip,
        limit,
        &format!("{}/webhooks", API_PREFIX),
        &extra,
    )))
}

pub async fn create_webhook(
    State(state): State<AppState>,
    body: Result<Json<NewWebhook>, JsonRejection>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<WebhookView>), ApiError> {
    let Json(new) = body?;
    let hook = state.dispatcher.registry().create(new)?;
    let location = webhook_href(hook.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(WebhookView::from(hook)),
    ))
}

pub async fn get_webhook(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<WebhookView>, ApiError> {
    let Path(id) = id?;
    let hook = state.dispatcher.registry().get(id)?;
    Ok(Json(hook.into()))
}

pub async fn update_webhook(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<WebhookUpdate>, JsonRejection>,
) -> Result<Json<WebhookView>, ApiError> {
    let Path(id) = id?;
    let Json(update) = body?;
    let hook = state.dispatcher.registry().update(id, update)?;
    Ok(Json(hook.into()))
}

pub async fn delete_webhook(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.dispatcher.registry().delete(id)?;
    state.dispatcher.log().remove(id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_deliveries(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Page<DeliveryView>>, ApiError> {
    let Path(id) = id?;
    let Query(pagination) = query?;
    let (skip, limit) = pagination.resolve(&state.config().api)?;

    // 404 for unknown webhooks rather than an empty page.
    state.dispatcher.registry().get(id)?;
    let (deliveries, total) = state.dispatcher.log().list(id, skip, limit);

    Ok(Json(Page::new(
        deliveries.into_iter().map(DeliveryView::from).collect(),
        total,
        skip,
        limit,
        &format!("{}/deliveries", webhook_href(id)),
        &[],
    )))
}

pub async fn test_webhook(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DeliveryView>, ApiError> {
    let Path(id) = id?;
    let delivery = state.dispatcher.send_test(id).await?;
    Ok(Json(delivery.into()))
}
