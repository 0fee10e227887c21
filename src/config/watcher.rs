//! Directory watchers for hot reload.
//!
//! # Responsibilities
//! - Subscribe to filesystem notifications under a directory tree
//! - Debounce bursts per file and hand batches of changed paths to a loop
//! - Config dir: reload the single affected file and dispatch the outcome
//! - Plugins dir: ask the restart coordinator for a restart
//!
//! # Design Decisions
//! - The OS facility sits behind [`WatchTree`] so the loops can be driven by
//!   other backends (tests, polling)
//! - Recursive watching is native on macOS (FSEvents) and Windows; on Linux
//!   and the BSDs notify emulates it with one watch per subdirectory, so
//!   directories created later are picked up but very deep trees can exhaust
//!   `fs.inotify.max_user_watches`
//! - Each loop processes its batches serially, in emission order; the two
//!   loops are independent tasks

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{EventKind, RecursiveMode, Watcher};
use notify_debouncer_full::{new_debouncer, DebounceEventResult};
use tokio::sync::{broadcast, mpsc, Mutex};

use crate::config::dispatch::{ChangeDispatcher, WatchEvent};
use crate::config::error::ConfigError;
use crate::config::reload::ReloadState;
use crate::config::restart::{RestartCoordinator, RestartTrigger};
use crate::config::store::ConfigStore;

/// One debounced batch of changed paths, or a backend failure.
pub type FsBatch = Result<Vec<PathBuf>, ConfigError>;

/// Keeps an OS watch alive; dropping it detaches the watch.
pub type WatchGuard = Box<dyn Any + Send>;

/// Capability to watch a directory tree.
pub trait WatchTree: Send + Sync {
    /// Start watching `root` recursively. Batches arrive on the returned
    /// receiver until the guard is dropped.
    fn watch_tree(
        &self,
        root: &Path,
        debounce: Duration,
    ) -> Result<(WatchGuard, mpsc::UnboundedReceiver<FsBatch>), ConfigError>;
}

/// [`WatchTree`] backed by the platform's recommended notify watcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotifyWatchTree;

impl WatchTree for NotifyWatchTree {
    fn watch_tree(
        &self,
        root: &Path,
        debounce: Duration,
    ) -> Result<(WatchGuard, mpsc::UnboundedReceiver<FsBatch>), ConfigError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let watched = root.to_path_buf();

        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            let batch = match result {
                Ok(events) => Ok(changed_paths(events.iter().map(|e| &e.event))),
                Err(errors) => Err(ConfigError::watch(&watched, format!("{:?}", errors))),
            };
            let _ = tx.send(batch);
        })
        .map_err(|e| ConfigError::watch(root, format!("failed to create watcher: {}", e)))?;

        debouncer
            .watcher()
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| ConfigError::watch(root, format!("failed to watch: {}", e)))?;

        Ok((Box::new(debouncer), rx))
    }
}

/// Paths touched by creations, modifications and removals, de-duplicated
/// in first-seen order.
fn changed_paths<'a>(events: impl Iterator<Item = &'a notify::Event>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for event in events {
        if !matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) {
            continue;
        }
        for path in &event.paths {
            if !paths.contains(path) {
                paths.push(path.clone());
            }
        }
    }
    paths
}

/// Reload loop for the config directory.
pub struct ConfigDirWatcher {
    pub(crate) state: Arc<Mutex<ReloadState>>,
    pub(crate) store: Arc<ConfigStore>,
    pub(crate) dispatcher: Arc<ChangeDispatcher>,
}

impl ConfigDirWatcher {
    /// Process batches until the channel closes or shutdown fires.
    pub async fn run(
        self,
        mut batches: mpsc::UnboundedReceiver<FsBatch>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let dir = self.state.lock().await.config_dir().to_path_buf();
        tracing::info!(path = %dir.display(), "Config watcher started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                batch = batches.recv() => match batch {
                    Some(Ok(paths)) => {
                        for path in paths {
                            self.handle(&path).await;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Config watch error");
                        self.dispatcher
                            .dispatch(&WatchEvent::error(dir.display().to_string(), e));
                    }
                    None => break,
                },
            }
        }

        tracing::info!(path = %dir.display(), "Config watcher stopped");
    }

    async fn handle(&self, path: &Path) {
        let event = {
            let mut state = self.state.lock().await;
            state.handle_path(path, &self.store).await
        };
        if let Some(event) = event {
            self.dispatcher.dispatch(&event);
        }
    }
}

/// Restart-only loop for the plugins directory.
pub struct PluginDirWatcher {
    pub(crate) dir: PathBuf,
    pub(crate) extensions: Vec<String>,
    pub(crate) coordinator: Arc<RestartCoordinator>,
}

impl PluginDirWatcher {
    pub async fn run(
        self,
        mut batches: mpsc::UnboundedReceiver<FsBatch>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!(path = %self.dir.display(), "Plugin watcher started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                batch = batches.recv() => match batch {
                    Some(Ok(paths)) => {
                        for path in paths.iter().filter(|p| self.is_relevant(p)) {
                            tracing::info!(path = %path.display(), "Plugin file changed");
                            self.coordinator.evaluate(RestartTrigger::Plugin(path));
                        }
                    }
                    Some(Err(e)) => tracing::error!(error = %e, "Plugin watch error"),
                    None => break,
                },
            }
        }

        tracing::info!(path = %self.dir.display(), "Plugin watcher stopped");
    }

    fn is_relevant(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}
