//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IspOpsConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// REST API settings (auth, pagination).
    pub api: ApiConfig,

    /// Circuit breaker thresholds and storage.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Webhook dispatch settings.
    pub webhooks: WebhookConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Inbound request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// REST API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Require `Authorization: Bearer <api_key>` on `/api/v1`.
    pub auth_enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Page size used when `limit` is absent.
    pub default_page_size: usize,

    /// Upper bound for `limit`.
    pub max_page_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            auth_enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            default_page_size: 50,
            max_page_size: 500,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Enable the circuit breaker middleware.
    pub enabled: bool,

    /// Consecutive failures before a circuit opens.
    pub failure_threshold: u32,

    /// Time an open circuit waits before allowing a trial request.
    pub recovery_timeout_ms: u64,

    /// Request path prefixes guarded by the middleware.
    pub guarded_prefixes: Vec<String>,

    /// Per-path overrides. Longest matching prefix wins.
    pub paths: Vec<PathPolicyConfig>,

    /// Shared key-value store URL (e.g. "redis://127.0.0.1:6379").
    /// Local in-process state only when unset.
    pub redis_url: Option<String>,

    /// Prefix for keys written to the shared store.
    pub key_prefix: String,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: 5,
            recovery_timeout_ms: 30_000,
            guarded_prefixes: vec!["/api/v1".to_string()],
            paths: Vec::new(),
            redis_url: None,
            key_prefix: "circuit".to_string(),
        }
    }
}

/// Per-path circuit breaker override.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PathPolicyConfig {
    /// Path prefix this policy applies to. Also used as the circuit key.
    pub path: String,

    /// Overrides `failure_threshold`.
    #[serde(default)]
    pub failure_threshold: Option<u32>,

    /// Overrides `recovery_timeout_ms`.
    #[serde(default)]
    pub recovery_timeout_ms: Option<u64>,
}

/// Webhook dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Per-delivery HTTP timeout in milliseconds.
    pub delivery_timeout_ms: u64,

    /// Delivery log entries kept per webhook (oldest dropped first).
    pub max_deliveries_per_webhook: usize,

    /// Response bodies longer than this are truncated in the delivery log.
    pub max_response_body_bytes: usize,

    /// User-Agent sent with deliveries.
    pub user_agent: String,

    /// Optional JSON file the registry is loaded from and saved to.
    pub persistence_path: Option<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            delivery_timeout_ms: 10_000,
            max_deliveries_per_webhook: 100,
            max_response_body_bytes: 4096,
            user_agent: concat!("isp-ops-webhooks/", env!("CARGO_PKG_VERSION")).to_string(),
            persistence_path: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
