//! ISP operations service library.
//!
//! Circuit breaking for inbound API paths (shared Redis state with an
//! in-process fallback) and outbound webhook delivery of domain events
//! (HMAC-SHA256 signed, fanned out concurrently, logged per attempt).

// Core subsystems
pub mod api;
pub mod config;
pub mod http;

// Domain
pub mod resilience;
pub mod webhooks;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::IspOpsConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
