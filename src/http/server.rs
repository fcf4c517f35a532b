//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build shared application state (config, circuit breaker, webhooks)
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, metrics, circuit breaker)
//! - Apply hot-reloaded configuration
//! - Serve until shutdown is signalled

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::api;
use crate::config::IspOpsConfig;
use crate::http::middleware::{circuit_breaker_middleware, track_metrics};
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::resilience::{CircuitBreaker, KeyValueStore};
use crate::webhooks::{DeliveryLog, WebhookDispatcher, WebhookError, WebhookRegistry};

/// Errors raised while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("webhook registry: {0}")]
    Webhooks(#[from] WebhookError),

    #[error("HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArcSwap<IspOpsConfig>>,
    pub circuit_breaker: Arc<CircuitBreaker>,
    pub dispatcher: WebhookDispatcher,
}

impl AppState {
    /// Build state from config. `store = None` keeps circuit state in process.
    pub fn new(
        config: IspOpsConfig,
        store: Option<Arc<dyn KeyValueStore>>,
    ) -> Result<Self, ServerError> {
        let registry = match &config.webhooks.persistence_path {
            Some(path) => WebhookRegistry::load_from_file(path)?,
            None => WebhookRegistry::new(None),
        };
        let log = DeliveryLog::new(config.webhooks.max_deliveries_per_webhook);
        let dispatcher = WebhookDispatcher::new(registry, log, &config.webhooks)?;
        let circuit_breaker = Arc::new(CircuitBreaker::new(&config.circuit_breaker, store));

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            circuit_breaker,
            dispatcher,
        })
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<IspOpsConfig> {
        self.config.load_full()
    }

    /// Swap in a reloaded configuration.
    pub fn apply_config(&self, config: IspOpsConfig) {
        self.circuit_breaker.update_policies(&config.circuit_breaker);
        self.config.store(Arc::new(config));
        tracing::info!("Configuration reloaded");
    }
}

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        let routes = Router::new()
            .route("/health", get(health))
            .nest("/api/v1", api::router(state.clone()));
        Self::guard(routes, &state)
            .layer(middleware::from_fn(track_metrics))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(set_request_id_layer())
    }

    /// Wrap `routes` in the request timeout, then the circuit breaker, so a
    /// timed-out request is reported to the breaker as a failure.
    #[allow(deprecated)]
    pub fn guard(routes: Router, state: &AppState) -> Router {
        let request_secs = state.config().timeouts.request_secs;
        routes
            .layer(TimeoutLayer::new(Duration::from_secs(request_secs)))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                circuit_breaker_middleware,
            ))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve on `listener` until `shutdown` fires, applying config updates as
    /// they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<IspOpsConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let state = self.state.clone();
        let reload_task = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                state.apply_config(config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reload_task.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
