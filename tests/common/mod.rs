//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use futures_util::future::BoxFuture;
use tokio::net::TcpListener;

use isp_ops::config::IspOpsConfig;
use isp_ops::http::{AppState, HttpServer};

/// One request as seen by a mock subscriber.
#[derive(Debug, Clone)]
pub struct Captured {
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// A loopback HTTP endpoint that records every request it receives.
pub struct MockSubscriber {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<Captured>>>,
}

impl MockSubscriber {
    pub fn url(&self) -> String {
        format!("http://{}/hook", self.addr)
    }

    pub fn received(&self) -> Vec<Captured> {
        self.received.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

type Responder = Arc<dyn Fn() -> BoxFuture<'static, (u16, String)> + Send + Sync>;

#[derive(Clone)]
struct SubscriberState {
    received: Arc<Mutex<Vec<Captured>>>,
    respond: Responder,
}

async fn capture(State(state): State<SubscriberState>, request: Request<Body>) -> (StatusCode, String) {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    state.received.lock().unwrap().push(Captured {
        headers: parts.headers,
        body,
    });
    let (status, body) = (state.respond)().await;
    (StatusCode::from_u16(status).unwrap_or(StatusCode::OK), body)
}

/// Start a subscriber that always answers with `status` and `body`.
pub async fn start_subscriber(status: u16, body: &'static str) -> MockSubscriber {
    start_programmable_subscriber(move || async move { (status, body.to_string()) }).await
}

/// Start a subscriber whose responses are produced by `f`.
pub async fn start_programmable_subscriber<F, Fut>(f: F) -> MockSubscriber
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = SubscriberState {
        received: received.clone(),
        respond: Arc::new(move || -> BoxFuture<'static, (u16, String)> { Box::pin(f()) }),
    };
    let app = Router::new().fallback(capture).with_state(state);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockSubscriber { addr, received }
}

/// A loopback URL nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/hook", addr)
}

/// Defaults suitable for tests: no metrics exporter, fast circuits.
pub fn test_config() -> IspOpsConfig {
    let mut config = IspOpsConfig::default();
    config.observability.metrics_enabled = false;
    config.circuit_breaker.failure_threshold = 3;
    config.circuit_breaker.recovery_timeout_ms = 200;
    config.webhooks.delivery_timeout_ms = 2_000;
    config
}

/// Serve the full router on a loopback listener. Returns the base URL.
pub async fn spawn_app(config: IspOpsConfig) -> (String, AppState) {
    let state = AppState::new(config, None).unwrap();
    let router = HttpServer::new(state.clone()).router();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    (format!("http://{}", addr), state)
}
