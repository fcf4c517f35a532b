//! Webhook fan-out.
//!
//! # Responsibilities
//! - Resolve subscribers for an event
//! - Build and sign one envelope per subscriber
//! - POST to all subscribers concurrently
//! - Record every outcome in the delivery log
//!
//! # Design Decisions
//! - One attempt per subscriber; failures are logged, not retried
//! - A 2xx response is a success, anything else (or no response) a failure
//! - All envelopes of one dispatch share the same timestamp
//! - The fan-out is a spawned task and outlives a dropped caller
//! - Response bodies are read only up to the configured cap

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::WebhookConfig;
use crate::observability::metrics;
use crate::webhooks::delivery_log::DeliveryLog;
use crate::webhooks::registry::WebhookRegistry;
use crate::webhooks::signing::{
    signature_header_value, DELIVERY_ID_HEADER, EVENT_HEADER, SIGNATURE_HEADER, WEBHOOK_ID_HEADER,
};
use crate::webhooks::types::{
    validate_event_name, DispatchReport, Webhook, WebhookDelivery, WebhookEnvelope, TEST_EVENT,
};
use crate::webhooks::WebhookError;

/// Delivers domain events to registered webhooks.
#[derive(Clone)]
pub struct WebhookDispatcher {
    registry: WebhookRegistry,
    log: DeliveryLog,
    client: reqwest::Client,
    max_response_body_bytes: usize,
}

impl WebhookDispatcher {
    pub fn new(
        registry: WebhookRegistry,
        log: DeliveryLog,
        config: &WebhookConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.delivery_timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            registry,
            log,
            client,
            max_response_body_bytes: config.max_response_body_bytes,
        })
    }

    pub fn registry(&self) -> &WebhookRegistry {
        &self.registry
    }

    pub fn log(&self) -> &DeliveryLog {
        &self.log
    }

    /// Send `event` to every active subscriber and wait for all outcomes.
    ///
    /// The fan-out runs on its own task: if the caller is dropped (request
    /// timeout, client disconnect) deliveries still finish and are logged.
    pub async fn dispatch(&self, event: &str, data: Value) -> Result<DispatchReport, WebhookError> {
        validate_event_name(event)?;

        let subscribers = self.registry.subscribers_for(event);
        if subscribers.is_empty() {
            tracing::debug!(event, "No subscribers for event");
            return Ok(DispatchReport::from_deliveries(event, Vec::new()));
        }

        tracing::info!(event, subscribers = subscribers.len(), "Dispatching event");
        let this = self.clone();
        let event = event.to_string();
        let task = tokio::spawn(async move {
            let timestamp = Utc::now();
            let deliveries = join_all(
                subscribers
                    .iter()
                    .map(|hook| this.deliver(hook, &event, &data, timestamp)),
            )
            .await;
            DispatchReport::from_deliveries(&event, deliveries)
        });

        let report = task
            .await
            .map_err(|e| WebhookError::Dispatch(e.to_string()))?;
        tracing::info!(
            event = %report.event,
            succeeded = report.succeeded,
            failed = report.failed,
            "Event dispatched"
        );
        Ok(report)
    }

    /// Send a `webhook.test` event to one webhook, ignoring its event filter.
    pub async fn send_test(&self, webhook_id: Uuid) -> Result<WebhookDelivery, WebhookError> {
        let hook = self.registry.get(webhook_id)?;
        let data = json!({
            "message": "Test delivery",
            "webhook_id": hook.id,
        });
        let this = self.clone();
        tokio::spawn(async move { this.deliver(&hook, TEST_EVENT, &data, Utc::now()).await })
            .await
            .map_err(|e| WebhookError::Dispatch(e.to_string()))
    }

    async fn deliver(
        &self,
        hook: &Webhook,
        event: &str,
        data: &Value,
        timestamp: DateTime<Utc>,
    ) -> WebhookDelivery {
        let delivery_id = Uuid::new_v4();
        let start = Instant::now();
        let envelope = WebhookEnvelope {
            event: event.to_string(),
            timestamp,
            webhook_id: hook.id,
            data: data.clone(),
        };

        let (response_status, response_body, error) = match serde_json::to_vec(&envelope) {
            Ok(body) => self.post(hook, event, delivery_id, body).await,
            Err(e) => (None, None, Some(format!("failed to encode envelope: {}", e))),
        };
        let success = response_status.is_some_and(|s| (200..300).contains(&s));

        let delivery = WebhookDelivery {
            id: delivery_id,
            webhook_id: hook.id,
            event: event.to_string(),
            payload: serde_json::to_value(&envelope).unwrap_or(Value::Null),
            response_status,
            response_body,
            error,
            success,
            duration_ms: start.elapsed().as_millis() as u64,
            delivered_at: Utc::now(),
        };

        if success {
            tracing::debug!(webhook_id = %hook.id, event, status = ?response_status, "Webhook delivered");
        } else {
            tracing::warn!(
                webhook_id = %hook.id,
                url = %hook.url,
                event,
                status = ?response_status,
                error = ?delivery.error,
                "Webhook delivery failed"
            );
        }
        metrics::record_delivery(event, success, start);
        // A webhook deleted mid-flight keeps no history.
        if self.registry.get(hook.id).is_ok() {
            self.log.record(delivery.clone());
        } else {
            tracing::debug!(webhook_id = %hook.id, "Webhook deleted during delivery, not logged");
        }
        delivery
    }

    async fn post(
        &self,
        hook: &Webhook,
        event: &str,
        delivery_id: Uuid,
        body: Vec<u8>,
    ) -> (Option<u16>, Option<String>, Option<String>) {
        let mut request = self
            .client
            .post(&hook.url)
            .header(CONTENT_TYPE, "application/json")
            .header(EVENT_HEADER, event)
            .header(WEBHOOK_ID_HEADER, hook.id.to_string())
            .header(DELIVERY_ID_HEADER, delivery_id.to_string());
        if let Some(secret) = &hook.secret {
            request = request.header(SIGNATURE_HEADER, signature_header_value(secret, &body));
        }

        match request.body(body).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = match read_capped(response, self.max_response_body_bytes).await {
                    Ok(bytes) => Some(utf8_prefix(&bytes)),
                    Err(e) => {
                        tracing::debug!(webhook_id = %hook.id, error = %e, "Failed to read response body");
                        None
                    }
                };
                (Some(status), body, None)
            }
            Err(e) => (None, None, Some(e.to_string())),
        }
    }
}

/// Read at most `limit` bytes of the body, then stop.
async fn read_capped(mut response: reqwest::Response, limit: usize) -> Result<Vec<u8>, reqwest::Error> {
    let mut buf = Vec::new();
    while buf.len() < limit {
        match response.chunk().await? {
            Some(chunk) => {
                let take = chunk.len().min(limit - buf.len());
                buf.extend_from_slice(&chunk[..take]);
            }
            None => break,
        }
    }
    Ok(buf)
}

/// Decode a truncated body, dropping a multi-byte character split at the cut.
fn utf8_prefix(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(e) if e.error_len().is_none() => {
            String::from_utf8_lossy(&bytes[..e.valid_up_to()]).into_owned()
        }
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}
