//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::IspOpsConfig;

/// Watches a config file and pushes each successfully validated revision.
///
/// The parent directory is watched rather than the file itself so that
/// editors which save by rename keep triggering reloads.
pub struct ConfigWatcher {
    path: PathBuf,
    updates: mpsc::UnboundedSender<IspOpsConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end of validated revisions.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<IspOpsConfig>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            updates,
        };
        (watcher, rx)
    }

    /// Another sender into the same update stream (e.g. for SIGHUP reloads).
    pub fn updates(&self) -> mpsc::UnboundedSender<IspOpsConfig> {
        self.updates.clone()
    }

    /// Start watching. Dropping the returned handle stops the watch.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let target = self.path.clone();
        let file_name = target.file_name().map(|n| n.to_os_string());
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let updates = self.updates;

        let handler = move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!(error = ?e, "Config watch error");
                    return;
                }
            };
            if !(event.kind.is_modify() || event.kind.is_create()) {
                return;
            }
            let touches_target = event
                .paths
                .iter()
                .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
            if !touches_target {
                return;
            }

            tracing::info!(path = ?target, "Config file changed, reloading");
            match load_config(&target) {
                Ok(config) => {
                    if updates.send(config).is_err() {
                        tracing::debug!("Config receiver dropped, ignoring reload");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Config reload rejected, keeping current configuration");
                }
            }
        };

        let mut watcher = RecommendedWatcher::new(
            handler,
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}
