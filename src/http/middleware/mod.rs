//! Request middleware.
//!
//! # Order (outermost first, inside the request id and trace layers)
//! ```text
//! metrics.rs          → count and time every request
//! circuit_breaker.rs  → fail fast on guarded paths whose circuit is open
//! (request timeout)   → 408 once the handler overruns
//! auth.rs             → API key on /api/v1
//! ```

pub mod auth;
pub mod circuit_breaker;
pub mod metrics;

pub use auth::require_api_key;
pub use circuit_breaker::circuit_breaker_middleware;
pub use metrics::track_metrics;
