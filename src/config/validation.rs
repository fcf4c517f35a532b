//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, thresholds > 0)
//! - Validate addresses and URLs
//! - Detect duplicate per-path circuit policies
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: IspOpsConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::IspOpsConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &IspOpsConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let api = &config.api;
    if api.auth_enabled && api.api_key.trim().is_empty() {
        errors.push(ValidationError::new("api.api_key", "must be set when auth is enabled"));
    }
    if api.default_page_size == 0 {
        errors.push(ValidationError::new("api.default_page_size", "must be greater than 0"));
    }
    if api.max_page_size < api.default_page_size {
        errors.push(ValidationError::new(
            "api.max_page_size",
            "must be at least api.default_page_size",
        ));
    }

    let cb = &config.circuit_breaker;
    if cb.failure_threshold == 0 {
        errors.push(ValidationError::new(
            "circuit_breaker.failure_threshold",
            "must be greater than 0",
        ));
    }
    if cb.recovery_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "circuit_breaker.recovery_timeout_ms",
            "must be greater than 0",
        ));
    }
    if cb.key_prefix.is_empty() {
        errors.push(ValidationError::new("circuit_breaker.key_prefix", "must not be empty"));
    }
    if let Some(redis_url) = &cb.redis_url {
        match url::Url::parse(redis_url) {
            Ok(u) if u.scheme() == "redis" || u.scheme() == "rediss" => {}
            _ => errors.push(ValidationError::new(
                "circuit_breaker.redis_url",
                format!("'{}' is not a redis:// URL", redis_url),
            )),
        }
    }
    for (i, prefix) in cb.guarded_prefixes.iter().enumerate() {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::new(
                format!("circuit_breaker.guarded_prefixes[{}]", i),
                "must start with '/'",
            ));
        }
    }

    let mut seen = HashSet::new();
    for (i, policy) in cb.paths.iter().enumerate() {
        let field = format!("circuit_breaker.paths[{}]", i);
        if !policy.path.starts_with('/') {
            errors.push(ValidationError::new(format!("{}.path", field), "must start with '/'"));
        }
        if !seen.insert(policy.path.as_str()) {
            errors.push(ValidationError::new(
                format!("{}.path", field),
                format!("duplicate policy for '{}'", policy.path),
            ));
        }
        if policy.failure_threshold == Some(0) {
            errors.push(ValidationError::new(
                format!("{}.failure_threshold", field),
                "must be greater than 0",
            ));
        }
        if policy.recovery_timeout_ms == Some(0) {
            errors.push(ValidationError::new(
                format!("{}.recovery_timeout_ms", field),
                "must be greater than 0",
            ));
        }
    }

    let wh = &config.webhooks;
    if wh.delivery_timeout_ms == 0 {
        errors.push(ValidationError::new("webhooks.delivery_timeout_ms", "must be greater than 0"));
    }
    if wh.max_deliveries_per_webhook == 0 {
        errors.push(ValidationError::new(
            "webhooks.max_deliveries_per_webhook",
            "must be greater than 0",
        ));
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::PathPolicyConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&IspOpsConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = IspOpsConfig::default();
        config.listener.bind_address = "nope".into();
        config.circuit_breaker.failure_threshold = 0;
        config.circuit_breaker.redis_url = Some("http://cache:6379".into());
        config.webhooks.delivery_timeout_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(errors.len(), 4);
        assert!(fields.contains(&"listener.bind_address"));
        assert!(fields.contains(&"circuit_breaker.failure_threshold"));
        assert!(fields.contains(&"circuit_breaker.redis_url"));
        assert!(fields.contains(&"webhooks.delivery_timeout_ms"));
    }

    #[test]
    fn test_duplicate_path_policy() {
        let mut config = IspOpsConfig::default();
        let policy = PathPolicyConfig {
            path: "/api/v1/events".into(),
            failure_threshold: Some(2),
            recovery_timeout_ms: None,
        };
        config.circuit_breaker.paths = vec![policy.clone(), policy];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("duplicate"));
    }
}
