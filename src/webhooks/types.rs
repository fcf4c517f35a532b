//! Webhook registrations, envelopes and delivery records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::webhooks::WebhookError;

/// Subscribes to every event.
pub const WILDCARD_EVENT: &str = "*";

/// Event sent by `send_test`, regardless of the webhook's filter.
pub const TEST_EVENT: &str = "webhook.test";

/// A subscriber registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Webhook {
    pub id: Uuid,
    pub url: String,
    pub events: Vec<String>,
    /// HMAC key. Persisted, but never exposed by the API.
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Webhook {
    /// Whether this webhook should receive `event`.
    pub fn subscribes_to(&self, event: &str) -> bool {
        self.is_active && self.events.iter().any(|e| e == WILDCARD_EVENT || e == event)
    }
}

/// Payload for registering a webhook.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewWebhook {
    pub url: String,
    pub events: Vec<String>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Partial update. Absent fields are left unchanged; an empty `secret`
/// removes signing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WebhookUpdate {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub events: Option<Vec<String>>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Body POSTed to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookEnvelope {
    pub event: String,
    pub timestamp: DateTime<Utc>,
    pub webhook_id: Uuid,
    pub data: Value,
}

/// Audit record of one delivery attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDelivery {
    pub id: Uuid,
    pub webhook_id: Uuid,
    pub event: String,
    pub payload: Value,
    pub response_status: Option<u16>,
    pub response_body: Option<String>,
    /// Transport error when no response was received.
    pub error: Option<String>,
    pub success: bool,
    pub duration_ms: u64,
    pub delivered_at: DateTime<Utc>,
}

/// Outcome of fanning one event out to its subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReport {
    pub event: String,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub deliveries: Vec<WebhookDelivery>,
}

impl DispatchReport {
    pub fn from_deliveries(event: &str, deliveries: Vec<WebhookDelivery>) -> Self {
        let succeeded = deliveries.iter().filter(|d| d.success).count();
        Self {
            event: event.to_string(),
            attempted: deliveries.len(),
            succeeded,
            failed: deliveries.len() - succeeded,
            deliveries,
        }
    }
}

/// Event names are `resource.action` segments of `[a-z0-9_]`.
pub fn validate_event_name(event: &str) -> Result<(), WebhookError> {
    let segments: Vec<&str> = event.split('.').collect();
    let well_formed = segments.len() >= 2
        && segments.iter().all(|s| {
            !s.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        });
    if well_formed {
        Ok(())
    } else {
        Err(WebhookError::Validation(format!(
            "invalid event name '{}': expected resource.action",
            event
        )))
    }
}

/// Validate a subscription list; `*` is accepted as a wildcard.
pub fn normalize_events(events: &[String]) -> Result<Vec<String>, WebhookError> {
    if events.is_empty() {
        return Err(WebhookError::Validation("events must not be empty".into()));
    }
    let mut out: Vec<String> = Vec::with_capacity(events.len());
    for raw in events {
        let event = raw.trim();
        if event != WILDCARD_EVENT {
            validate_event_name(event)?;
        }
        if !out.iter().any(|e| e == event) {
            out.push(event.to_string());
        }
    }
    Ok(out)
}

/// Subscriber URLs must be absolute http(s). Returns the normalized form.
pub fn normalize_url(raw: &str) -> Result<String, WebhookError> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| WebhookError::Validation(format!("invalid url '{}': {}", raw, e)))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed.to_string()),
        _ => Err(WebhookError::Validation(format!(
            "invalid url '{}': must be an http or https URL",
            raw
        ))),
    }
}
