//! Circuit breaker for request paths.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: path assumed broken, requests fail fast
//! - Half-Open: one trial request checks for recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= failure_threshold
//! Open → Half-Open: recovery timeout elapsed since last failure
//! Half-Open → Closed: trial request succeeds
//! Half-Open → Open: trial request fails
//! ```
//!
//! # Design Decisions
//! - Per-path circuit (longest configured prefix, else the raw path)
//! - Shared store preferred; every store error falls back to local state
//! - Writes are mirrored locally so the fallback holds the last known state
//! - No locking: the failure counter relies on the store's atomic increment
//! - A lost trial (never reported) is re-granted after another recovery timeout

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::config::{CircuitBreakerConfig, PathPolicyConfig};
use crate::observability::metrics;
use crate::resilience::store::{KeyValueStore, StoreError};

/// Circuit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    #[default]
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CircuitState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLOSED" => Ok(CircuitState::Closed),
            "OPEN" => Ok(CircuitState::Open),
            "HALF_OPEN" => Ok(CircuitState::HalfOpen),
            other => Err(format!("unknown circuit state '{}'", other)),
        }
    }
}

/// Thresholds resolved for one request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitPolicy {
    /// Circuit key (the matching policy prefix, or the request path).
    pub key: String,
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
}

/// Default thresholds plus per-path overrides.
#[derive(Debug, Clone)]
pub struct CircuitPolicies {
    failure_threshold: u32,
    recovery_timeout: Duration,
    /// Sorted longest prefix first.
    paths: Vec<PathPolicyConfig>,
}

impl CircuitPolicies {
    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        let mut paths = config.paths.clone();
        paths.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        Self {
            failure_threshold: config.failure_threshold,
            recovery_timeout: Duration::from_millis(config.recovery_timeout_ms),
            paths,
        }
    }

    /// Resolve the policy for a request path.
    pub fn resolve(&self, path: &str) -> CircuitPolicy {
        match self.paths.iter().find(|p| path_has_prefix(path, &p.path)) {
            Some(p) => CircuitPolicy {
                key: p.path.clone(),
                failure_threshold: p.failure_threshold.unwrap_or(self.failure_threshold),
                recovery_timeout: p
                    .recovery_timeout_ms
                    .map(Duration::from_millis)
                    .unwrap_or(self.recovery_timeout),
            },
            None => CircuitPolicy {
                key: path.to_string(),
                failure_threshold: self.failure_threshold,
                recovery_timeout: self.recovery_timeout,
            },
        }
    }
}

/// Segment-aware prefix match: "/api/v1" matches "/api/v1/x" but not "/api/v10".
pub(crate) fn path_has_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix.trim_end_matches('/')) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Which storage answered a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateSource {
    Shared,
    Local,
}

/// Point-in-time view of one circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitStatus {
    pub path: String,
    pub state: CircuitState,
    pub failure_count: u64,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub failure_threshold: u32,
    pub recovery_timeout_ms: u64,
    pub backend: StateSource,
}

#[derive(Debug, Clone, Copy, Default)]
struct Snapshot {
    state: CircuitState,
    failures: u64,
    last_failure_ms: Option<i64>,
    trial_started_ms: Option<i64>,
}

#[derive(Clone, Copy)]
enum Field {
    State,
    Failures,
    LastFailure,
    TrialStarted,
}

impl Field {
    fn suffix(&self) -> &'static str {
        match self {
            Field::State => "state",
            Field::Failures => "failures",
            Field::LastFailure => "last_failure",
            Field::TrialStarted => "trial_started",
        }
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn elapsed_since(stamp_ms: Option<i64>) -> Duration {
    match stamp_ms {
        Some(ms) => Duration::from_millis(now_ms().saturating_sub(ms).max(0) as u64),
        None => Duration::MAX,
    }
}

/// Per-path circuit breaker with shared-store state and local fallback.
pub struct CircuitBreaker {
    store: Option<Arc<dyn KeyValueStore>>,
    local: DashMap<String, Snapshot>,
    policies: ArcSwap<CircuitPolicies>,
    key_prefix: String,
}

impl CircuitBreaker {
    /// Create a breaker. `store = None` keeps all state in process.
    pub fn new(config: &CircuitBreakerConfig, store: Option<Arc<dyn KeyValueStore>>) -> Self {
        Self {
            store,
            local: DashMap::new(),
            policies: ArcSwap::from_pointee(CircuitPolicies::from_config(config)),
            key_prefix: config.key_prefix.clone(),
        }
    }

    /// Swap thresholds after a config reload. Existing state is kept.
    pub fn update_policies(&self, config: &CircuitBreakerConfig) {
        self.policies.store(Arc::new(CircuitPolicies::from_config(config)));
        tracing::info!(paths = config.paths.len(), "Circuit breaker policies updated");
    }

    pub fn policy_for(&self, path: &str) -> CircuitPolicy {
        self.policies.load().resolve(path)
    }

    /// Whether a request to `path` may proceed.
    pub async fn is_service_available(&self, path: &str) -> bool {
        let policy = self.policy_for(path);
        let (snap, _) = self.load(&policy.key).await;

        match snap.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if elapsed_since(snap.last_failure_ms) >= policy.recovery_timeout {
                    self.write_trial_started(&policy.key, now_ms()).await;
                    self.transition(&policy.key, CircuitState::Open, CircuitState::HalfOpen)
                        .await;
                    true
                } else {
                    metrics::record_circuit_rejection(&policy.key);
                    false
                }
            }
            CircuitState::HalfOpen => {
                if elapsed_since(snap.trial_started_ms) >= policy.recovery_timeout {
                    tracing::debug!(path = %policy.key, "Trial request unanswered, granting another");
                    self.write_trial_started(&policy.key, now_ms()).await;
                    true
                } else {
                    metrics::record_circuit_rejection(&policy.key);
                    false
                }
            }
        }
    }

    /// Report a successful request to `path`.
    pub async fn record_success(&self, path: &str) {
        let policy = self.policy_for(path);
        let (snap, _) = self.load(&policy.key).await;

        match snap.state {
            CircuitState::HalfOpen => {
                self.write_failures(&policy.key, 0).await;
                self.transition(&policy.key, CircuitState::HalfOpen, CircuitState::Closed)
                    .await;
            }
            CircuitState::Closed => {
                if snap.failures > 0 {
                    self.write_failures(&policy.key, 0).await;
                }
            }
            // Stale response from before the trip.
            CircuitState::Open => {}
        }
    }

    /// Report a failed request to `path`.
    pub async fn record_failure(&self, path: &str) {
        let policy = self.policy_for(path);
        let (snap, _) = self.load(&policy.key).await;
        let now = now_ms();

        match snap.state {
            CircuitState::Closed => {
                let failures = self.increment_failures(&policy.key).await;
                self.write_last_failure(&policy.key, now).await;
                tracing::debug!(
                    path = %policy.key,
                    failures,
                    threshold = policy.failure_threshold,
                    "Failure recorded"
                );
                if failures >= u64::from(policy.failure_threshold) {
                    self.transition(&policy.key, CircuitState::Closed, CircuitState::Open)
                        .await;
                }
            }
            CircuitState::HalfOpen => {
                self.write_last_failure(&policy.key, now).await;
                self.transition(&policy.key, CircuitState::HalfOpen, CircuitState::Open)
                    .await;
            }
            CircuitState::Open => {}
        }
    }

    /// Current status of the circuit guarding `path`.
    pub async fn status(&self, path: &str) -> CircuitStatus {
        let policy = self.policy_for(path);
        let (snap, source) = self.load(&policy.key).await;
        CircuitStatus {
            path: policy.key,
            state: snap.state,
            failure_count: snap.failures,
            last_failure_at: snap
                .last_failure_ms
                .and_then(DateTime::<Utc>::from_timestamp_millis),
            failure_threshold: policy.failure_threshold,
            recovery_timeout_ms: policy.recovery_timeout.as_millis() as u64,
            backend: source,
        }
    }

    /// Status of every circuit known locally or in the shared store.
    pub async fn statuses(&self) -> Vec<CircuitStatus> {
        let mut keys: Vec<String> = self.local.iter().map(|r| r.key().clone()).collect();

        if let Some(store) = &self.store {
            let prefix = format!("{}:", self.key_prefix);
            match store.keys(&prefix).await {
                Ok(found) => keys.extend(
                    found
                        .iter()
                        .filter_map(|k| k.strip_prefix(&prefix))
                        .filter_map(|k| k.strip_suffix(":state"))
                        .map(str::to_string),
                ),
                Err(e) => self.store_failed("keys", &prefix, &e),
            }
        }

        // Keys recorded before a policy reload may now belong to a prefix circuit.
        let mut keys: Vec<String> = keys.iter().map(|k| self.policy_for(k).key).collect();
        keys.sort();
        keys.dedup();

        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            out.push(self.status(&key).await);
        }
        out
    }

    /// Force the circuit guarding `path` back to CLOSED.
    pub async fn reset(&self, path: &str) -> CircuitStatus {
        let policy = self.policy_for(path);
        self.local.insert(policy.key.clone(), Snapshot::default());
        if let Some(store) = &self.store {
            let key = self.store_key(&policy.key, Field::State);
            if let Err(e) = store.set(&key, CircuitState::Closed.as_str()).await {
                self.store_failed("set", &key, &e);
            }
            for field in [Field::Failures, Field::LastFailure, Field::TrialStarted] {
                let key = self.store_key(&policy.key, field);
                if let Err(e) = store.delete(&key).await {
                    self.store_failed("delete", &key, &e);
                }
            }
        }
        tracing::info!(path = %policy.key, "Circuit reset");
        self.status(&policy.key).await
    }

    fn store_key(&self, circuit: &str, field: Field) -> String {
        format!("{}:{}:{}", self.key_prefix, circuit, field.suffix())
    }

    fn store_failed(&self, op: &'static str, key: &str, error: &StoreError) {
        tracing::warn!(op, key, error = %error, "Circuit store error, using local state");
        metrics::record_store_fallback(op);
    }

    fn local_snapshot(&self, circuit: &str) -> Snapshot {
        self.local.get(circuit).map(|r| *r.value()).unwrap_or_default()
    }

    async fn load(&self, circuit: &str) -> (Snapshot, StateSource) {
        let Some(store) = &self.store else {
            return (self.local_snapshot(circuit), StateSource::Local);
        };
        match self.load_shared(store.as_ref(), circuit).await {
            Ok(snap) => (snap, StateSource::Shared),
            Err(e) => {
                self.store_failed("get", circuit, &e);
                (self.local_snapshot(circuit), StateSource::Local)
            }
        }
    }

    async fn load_shared(
        &self,
        store: &dyn KeyValueStore,
        circuit: &str,
    ) -> Result<Snapshot, StoreError> {
        let state = match store.get(&self.store_key(circuit, Field::State)).await? {
            Some(raw) => raw.parse::<CircuitState>().map_err(|_| StoreError::Corrupt {
                key: self.store_key(circuit, Field::State),
                value: raw,
            })?,
            None => CircuitState::Closed,
        };
        Ok(Snapshot {
            state,
            failures: self.get_number(store, circuit, Field::Failures).await?.unwrap_or(0),
            last_failure_ms: self.get_number(store, circuit, Field::LastFailure).await?,
            trial_started_ms: self.get_number(store, circuit, Field::TrialStarted).await?,
        })
    }

    async fn get_number<T: FromStr>(
        &self,
        store: &dyn KeyValueStore,
        circuit: &str,
        field: Field,
    ) -> Result<Option<T>, StoreError> {
        let key = self.store_key(circuit, field);
        match store.get(&key).await? {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| StoreError::Corrupt { key, value: raw }),
            None => Ok(None),
        }
    }

    async fn put(&self, circuit: &str, field: Field, value: String) {
        if let Some(store) = &self.store {
            let key = self.store_key(circuit, field);
            if let Err(e) = store.set(&key, &value).await {
                self.store_failed("set", &key, &e);
            }
        }
    }

    async fn transition(&self, circuit: &str, from: CircuitState, to: CircuitState) {
        self.local.entry(circuit.to_string()).or_default().state = to;
        self.put(circuit, Field::State, to.as_str().to_string()).await;
        tracing::info!(path = %circuit, from = %from, to = %to, "Circuit state changed");
        metrics::record_circuit_transition(circuit, to.as_str());
    }

    async fn increment_failures(&self, circuit: &str) -> u64 {
        if let Some(store) = &self.store {
            let key = self.store_key(circuit, Field::Failures);
            match store.incr(&key).await {
                Ok(n) => {
                    let n = n.max(0) as u64;
                    self.local.entry(circuit.to_string()).or_default().failures = n;
                    return n;
                }
                Err(e) => self.store_failed("incr", &key, &e),
            }
        }
        let mut entry = self.local.entry(circuit.to_string()).or_default();
        entry.failures += 1;
        entry.failures
    }

    async fn write_failures(&self, circuit: &str, value: u64) {
        self.local.entry(circuit.to_string()).or_default().failures = value;
        self.put(circuit, Field::Failures, value.to_string()).await;
    }

    async fn write_last_failure(&self, circuit: &str, at_ms: i64) {
        self.local.entry(circuit.to_string()).or_default().last_failure_ms = Some(at_ms);
        self.put(circuit, Field::LastFailure, at_ms.to_string()).await;
    }

    async fn write_trial_started(&self, circuit: &str, at_ms: i64) {
        self.local.entry(circuit.to_string()).or_default().trial_started_ms = Some(at_ms);
        self.put(circuit, Field::TrialStarted, at_ms.to_string()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::store::MemoryStore;
    use async_trait::async_trait;

    /// A store that is always down.
    struct DownStore;

    #[async_trait]
    impl KeyValueStore for DownStore {
        async fn get(&self, _: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn set(&self, _: &str, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn incr(&self, _: &str) -> Result<i64, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn delete(&self, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn keys(&self, _: &str) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        fn name(&self) -> &'static str {
            "down"
        }
    }

    fn config(threshold: u32, recovery_ms: u64) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: threshold,
            recovery_timeout_ms: recovery_ms,
            ..CircuitBreakerConfig::default()
        }
    }

    #[test]
    fn test_state_string_forms() {
        for state in [CircuitState::Closed, CircuitState::Open, CircuitState::HalfOpen] {
            assert_eq!(state.as_str().parse::<CircuitState>().unwrap(), state);
        }
        assert_eq!(
            serde_json::to_string(&CircuitState::HalfOpen).unwrap(),
            "\"HALF_OPEN\""
        );
        assert!("open".parse::<CircuitState>().is_err());
    }

    #[test]
    fn test_policy_resolution() {
        let mut cfg = config(5, 30_000);
        cfg.paths = vec![
            PathPolicyConfig {
                path: "/api/v1".into(),
                failure_threshold: Some(10),
                recovery_timeout_ms: None,
            },
            PathPolicyConfig {
                path: "/api/v1/events".into(),
                failure_threshold: Some(2),
                recovery_timeout_ms: Some(1_000),
            },
        ];
        let policies = CircuitPolicies::from_config(&cfg);

        let events = policies.resolve("/api/v1/events");
        assert_eq!(events.key, "/api/v1/events");
        assert_eq!(events.failure_threshold, 2);
        assert_eq!(events.recovery_timeout, Duration::from_millis(1_000));

        let hooks = policies.resolve("/api/v1/webhooks/123");
        assert_eq!(hooks.key, "/api/v1");
        assert_eq!(hooks.failure_threshold, 10);
        assert_eq!(hooks.recovery_timeout, Duration::from_millis(30_000));

        let other = policies.resolve("/api/v10/thing");
        assert_eq!(other.key, "/api/v10/thing");
        assert_eq!(other.failure_threshold, 5);
    }

    #[tokio::test]
    async fn test_trips_after_threshold() {
        let cb = CircuitBreaker::new(&config(3, 60_000), Some(Arc::new(MemoryStore::new())));

        for _ in 0..2 {
            cb.record_failure("/billing").await;
            assert!(cb.is_service_available("/billing").await);
        }
        cb.record_failure("/billing").await;
        assert!(!cb.is_service_available("/billing").await);

        let status = cb.status("/billing").await;
        assert_eq!(status.state, CircuitState::Open);
        assert_eq!(status.failure_count, 3);
        assert_eq!(status.backend, StateSource::Shared);
        assert!(status.last_failure_at.is_some());

        // Other paths are unaffected.
        assert!(cb.is_service_available("/radius").await);
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let cb = CircuitBreaker::new(&config(3, 60_000), None);
        cb.record_failure("/p").await;
        cb.record_failure("/p").await;
        cb.record_success("/p").await;
        cb.record_failure("/p").await;
        cb.record_failure("/p").await;
        assert!(cb.is_service_available("/p").await);
        assert_eq!(cb.status("/p").await.failure_count, 2);
    }

    #[tokio::test]
    async fn test_half_open_single_trial_then_close() {
        let cb = CircuitBreaker::new(&config(1, 50), Some(Arc::new(MemoryStore::new())));
        cb.record_failure("/p").await;
        assert!(!cb.is_service_available("/p").await);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cb.is_service_available("/p").await, "trial should be granted");
        assert_eq!(cb.status("/p").await.state, CircuitState::HalfOpen);
        assert!(!cb.is_service_available("/p").await, "only one trial at a time");

        cb.record_success("/p").await;
        let status = cb.status("/p").await;
        assert_eq!(status.state, CircuitState::Closed);
        assert_eq!(status.failure_count, 0);
        assert!(cb.is_service_available("/p").await);
    }

    #[tokio::test]
    async fn test_half_open_failure_reopens() {
        let cb = CircuitBreaker::new(&config(1, 50), None);
        cb.record_failure("/p").await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cb.is_service_available("/p").await);

        cb.record_failure("/p").await;
        assert_eq!(cb.status("/p").await.state, CircuitState::Open);
        assert!(!cb.is_service_available("/p").await);
    }

    #[tokio::test]
    async fn test_lost_trial_is_regranted() {
        let cb = CircuitBreaker::new(&config(1, 50), None);
        cb.record_failure("/p").await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cb.is_service_available("/p").await);
        assert!(!cb.is_service_available("/p").await);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cb.is_service_available("/p").await);
        assert_eq!(cb.status("/p").await.state, CircuitState::HalfOpen);
    }

    #[tokio::test]
    async fn test_success_while_open_is_ignored() {
        let cb = CircuitBreaker::new(&config(1, 60_000), None);
        cb.record_failure("/p").await;
        cb.record_success("/p").await;
        assert_eq!(cb.status("/p").await.state, CircuitState::Open);
    }

    #[tokio::test]
    async fn test_store_outage_falls_back_to_local() {
        let cb = CircuitBreaker::new(&config(2, 60_000), Some(Arc::new(DownStore)));
        assert!(cb.is_service_available("/p").await);

        cb.record_failure("/p").await;
        cb.record_failure("/p").await;
        assert!(!cb.is_service_available("/p").await);

        let status = cb.status("/p").await;
        assert_eq!(status.state, CircuitState::Open);
        assert_eq!(status.backend, StateSource::Local);
    }

    #[tokio::test]
    async fn test_shared_state_visible_to_other_replica() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let a = CircuitBreaker::new(&config(2, 60_000), Some(store.clone()));
        let b = CircuitBreaker::new(&config(2, 60_000), Some(store));

        a.record_failure("/p").await;
        b.record_failure("/p").await;
        assert!(!a.is_service_available("/p").await);
        assert!(!b.is_service_available("/p").await);
    }

    #[tokio::test]
    async fn test_reset_and_statuses() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let cb = CircuitBreaker::new(&config(1, 60_000), Some(store.clone()));
        cb.record_failure("/a").await;
        cb.record_failure("/b").await;

        // A circuit written only by another replica still shows up.
        store.set("circuit:/c:state", "OPEN").await.unwrap();

        let paths: Vec<_> = cb.statuses().await.into_iter().map(|s| s.path).collect();
        assert_eq!(paths, vec!["/a", "/b", "/c"]);

        let status = cb.reset("/a").await;
        assert_eq!(status.state, CircuitState::Closed);
        assert_eq!(status.failure_count, 0);
        assert!(status.last_failure_at.is_none());
        assert!(cb.is_service_available("/a").await);
    }

    #[tokio::test]
    async fn test_policy_update_applies_to_next_failure() {
        let cb = CircuitBreaker::new(&config(5, 60_000), None);
        cb.record_failure("/p").await;
        assert!(cb.is_service_available("/p").await);

        cb.update_policies(&config(2, 60_000));
        cb.record_failure("/p").await;
        assert!(!cb.is_service_available("/p").await);
    }

    #[tokio::test]
    async fn test_statuses_after_prefix_policy_added() {
        let cb = CircuitBreaker::new(&config(5, 60_000), Some(Arc::new(MemoryStore::new())));
        cb.record_failure("/api/v1/a/x").await;
        cb.record_failure("/api/v1/a/y").await;

        let mut cfg = config(5, 60_000);
        cfg.paths = vec![PathPolicyConfig {
            path: "/api/v1/a".into(),
            failure_threshold: Some(1),
            recovery_timeout_ms: None,
        }];
        cb.update_policies(&cfg);
        cb.record_failure("/api/v1/a/z").await;

        let statuses = cb.statuses().await;
        let paths: Vec<&str> = statuses.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, vec!["/api/v1/a"]);
        assert_eq!(statuses[0].state, CircuitState::Open);
    }
}
