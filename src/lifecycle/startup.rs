//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter
//! - Connect the shared circuit store (or fall back to local state)
//! - Build application state and the HTTP server
//! - Start the config watcher and signal handler
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, except an unreachable circuit store
//! - Subsystems initialize in order, not concurrently
//! - The listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::watcher::ConfigWatcher;
use crate::config::IspOpsConfig;
use crate::http::{AppState, HttpServer, ServerError};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::{spawn_signal_handler, ReloadTarget};
use crate::observability::metrics;
use crate::resilience::connect_shared_store;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("config watcher: {0}")]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the service until a shutdown signal arrives.
///
/// `config_path` enables hot reload (file watch and SIGHUP).
pub async fn run(config: IspOpsConfig, config_path: Option<PathBuf>) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let store = if config.circuit_breaker.enabled {
        connect_shared_store(&config.circuit_breaker).await
    } else {
        None
    };
    let bind_address = config.listener.bind_address.clone();
    let state = AppState::new(config, store)?;
    metrics::record_webhooks_registered(state.dispatcher.registry().count());
    let server = HttpServer::new(state);

    let shutdown = Shutdown::new();
    let (_watch_handle, config_updates, reload) = match config_path {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(&path);
            let reload = ReloadTarget {
                path,
                updates: watcher.updates(),
            };
            (Some(watcher.run()?), rx, Some(reload))
        }
        None => {
            let (_tx, rx) = mpsc::unbounded_channel();
            (None, rx, None)
        }
    };
    let signal_task = spawn_signal_handler(shutdown.clone(), reload);

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    server.run(listener, config_updates, shutdown.subscribe()).await?;
    signal_task.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
