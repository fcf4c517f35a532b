//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - Translate signals to internal events
//! - Trigger appropriate actions (shutdown, reload)
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A second SIGTERM/SIGINT exits immediately
//! - SIGHUP reloads the config file, it never shuts down

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{load_config, IspOpsConfig};
use crate::lifecycle::shutdown::Shutdown;

/// Exit code used when a second signal interrupts draining.
const FORCED_EXIT_CODE: i32 = 130;

/// Internal event a signal maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Shutdown,
    Reload,
}

/// Wait for the next relevant signal.
#[cfg(unix)]
pub async fn next_signal() -> std::io::Result<Signal> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut hangup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = terminate.recv() => Ok(Signal::Shutdown),
        _ = interrupt.recv() => Ok(Signal::Shutdown),
        _ = hangup.recv() => Ok(Signal::Reload),
    }
}

#[cfg(not(unix))]
pub async fn next_signal() -> std::io::Result<Signal> {
    tokio::signal::ctrl_c().await?;
    Ok(Signal::Shutdown)
}

/// Where SIGHUP reloads come from and where they go.
pub struct ReloadTarget {
    pub path: PathBuf,
    pub updates: mpsc::UnboundedSender<IspOpsConfig>,
}

/// Spawn the task that turns signals into shutdown and reload actions.
pub fn spawn_signal_handler(shutdown: Shutdown, reload: Option<ReloadTarget>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut shutting_down = false;
        loop {
            let signal = match next_signal().await {
                Ok(signal) => signal,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install signal handlers");
                    return;
                }
            };

            match signal {
                Signal::Shutdown if shutting_down => {
                    tracing::warn!("Second shutdown signal, exiting immediately");
                    std::process::exit(FORCED_EXIT_CODE);
                }
                Signal::Shutdown => {
                    tracing::info!("Shutdown signal received, draining");
                    shutting_down = true;
                    shutdown.trigger();
                }
                Signal::Reload => match &reload {
                    Some(target) => reload_from(target),
                    None => tracing::info!("SIGHUP ignored, no config file in use"),
                },
            }
        }
    })
}

fn reload_from(target: &ReloadTarget) {
    tracing::info!(path = ?target.path, "SIGHUP received, reloading configuration");
    match load_config(&target.path) {
        Ok(config) => {
            if target.updates.send(config).is_err() {
                tracing::debug!("Config receiver dropped, ignoring reload");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Config reload rejected, keeping current configuration");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reload_sends_valid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\ndefault_page_size = 20").unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        reload_from(&ReloadTarget {
            path: file.path().to_path_buf(),
            updates: tx,
        });
        assert_eq!(rx.try_recv().unwrap().api.default_page_size, 20);
    }

    #[test]
    fn test_reload_skips_invalid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\ndefault_page_size = 0").unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        reload_from(&ReloadTarget {
            path: file.path().to_path_buf(),
            updates: tx,
        });
        assert!(rx.try_recv().is_err());
    }
}
