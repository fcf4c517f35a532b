//! Webhook subsystem.
//!
//! # Data Flow
//! ```text
//! Domain event (event name + JSON data)
//!     → registry.rs (active subscribers whose event list matches)
//!     → dispatcher.rs (one envelope per subscriber, signed when a secret is set)
//!     → concurrent HTTP POSTs
//!     → delivery_log.rs (status, body or transport error per subscriber)
//! ```
//!
//! # Design Decisions
//! - At-most-once, fire-and-forget: no retry, no ordering, no idempotency key
//! - Delivery failures are recorded and counted, never raised to the caller
//! - Registry is in memory with optional JSON file persistence

pub mod delivery_log;
pub mod dispatcher;
pub mod registry;
pub mod signing;
pub mod types;

use thiserror::Error;
use uuid::Uuid;

pub use delivery_log::DeliveryLog;
pub use dispatcher::WebhookDispatcher;
pub use registry::WebhookRegistry;
pub use types::{
    DispatchReport, NewWebhook, Webhook, WebhookDelivery, WebhookEnvelope, WebhookUpdate,
    TEST_EVENT, WILDCARD_EVENT,
};

/// Errors raised by webhook registration and dispatch.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook {0} not found")]
    NotFound(Uuid),

    #[error("{0}")]
    Validation(String),

    #[error("a webhook is already registered for {0}")]
    Duplicate(String),

    #[error("registry persistence failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry file is malformed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("dispatch task failed: {0}")]
    Dispatch(String),
}
