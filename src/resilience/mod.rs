//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request on a guarded path:
//!     → circuit_breaker.rs (is_service_available? else 503)
//!     → handler runs
//!     → circuit_breaker.rs (record_success / record_failure on 5xx)
//!
//! Circuit state:
//!     → store.rs (shared key-value store, e.g. Redis)
//!     → in-process map when the store errors
//! ```
//!
//! # Design Decisions
//! - Best-effort resilience, not a correctness mechanism
//! - Store errors are soft: logged, counted, never surfaced to clients
//! - No consistency guarantee between replicas

pub mod circuit_breaker;
pub mod store;

pub use circuit_breaker::{CircuitBreaker, CircuitPolicy, CircuitState, CircuitStatus, StateSource};
pub use store::{connect_shared_store, KeyValueStore, MemoryStore, RedisStore, StoreError};
