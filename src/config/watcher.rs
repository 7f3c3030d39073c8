//! Hot reload of the target list.
//!
//! Only `[[targets]]` is re-applied at runtime. A reload that fails to parse
//! or validate is logged and ignored; the running target set stays as is.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::TargetConfig;

/// Watches the config file and emits the target list whenever it changes.
pub struct ConfigWatcher {
    path: PathBuf,
    current: Mutex<Vec<TargetConfig>>,
    tx: mpsc::UnboundedSender<Vec<TargetConfig>>,
}

impl ConfigWatcher {
    /// `initial` is the target list already applied at startup.
    pub fn new(
        path: &Path,
        initial: Vec<TargetConfig>,
    ) -> (Self, mpsc::UnboundedReceiver<Vec<TargetConfig>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            current: Mutex::new(initial),
            tx,
        };
        (watcher, rx)
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();

        let mut handle = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    if let Some(targets) = self.reload() {
                        let _ = self.tx.send(targets);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        handle.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?path, "Config watcher started");
        Ok(handle)
    }

    /// Re-read the file; `Some` only when the target list differs from the
    /// last one applied.
    fn reload(&self) -> Option<Vec<TargetConfig>> {
        let config = match load_config(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(path = ?self.path, error = %e, "Config reload rejected");
                return None;
            }
        };

        let mut current = self.current.lock();
        if *current == config.targets {
            tracing::debug!(path = ?self.path, "Config changed, target list unchanged");
            return None;
        }

        tracing::info!(path = ?self.path, targets = config.targets.len(), "Target list reloaded");
        *current = config.targets.clone();
        Some(config.targets)
    }
}
