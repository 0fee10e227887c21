//! `HotConfig`: lifecycle facade over the store, the reload path and the
//! watchers.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};

use crate::config::dispatch::{ChangeDispatcher, WatchEvent};
use crate::config::error::ConfigError;
use crate::config::reload::ReloadState;
use crate::config::restart::{RestartCoordinator, RestartRequest, RestartTrigger};
use crate::config::store::{ConfigStore, Snapshot};
use crate::config::watcher::{
    ConfigDirWatcher, FsBatch, NotifyWatchTree, PluginDirWatcher, WatchGuard, WatchTree,
};
use crate::lifecycle::Shutdown;
use crate::settings::EngineSettings;

/// Hot-reloading configuration engine.
///
/// Create one per process (or per test), call [`HotConfig::start`], read
/// through the accessors, and [`HotConfig::stop`] on the way out.
pub struct HotConfig {
    settings: EngineSettings,
    store: Arc<ConfigStore>,
    dispatcher: Arc<ChangeDispatcher>,
    state: Arc<Mutex<ReloadState>>,
    coordinator: Arc<RestartCoordinator>,
    restart_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<RestartRequest>>>,
    backend: Arc<dyn WatchTree>,
    guards: std::sync::Mutex<Vec<WatchGuard>>,
    shutdown: std::sync::Mutex<Shutdown>,
    running: AtomicBool,
}

impl HotConfig {
    /// Build an engine watching through the platform notify backend.
    pub fn new(settings: EngineSettings) -> Result<Self, ConfigError> {
        Self::with_watch_backend(settings, Arc::new(NotifyWatchTree))
    }

    /// Build an engine with a custom [`WatchTree`] backend.
    pub fn with_watch_backend(
        settings: EngineSettings,
        backend: Arc<dyn WatchTree>,
    ) -> Result<Self, ConfigError> {
        if settings.config_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingDirectoryPath);
        }

        let (coordinator, restart_rx) = RestartCoordinator::new(settings.restart_on_update);
        let state = ReloadState::new(&settings.config_dir, settings.remerge_on_base_change);

        Ok(Self {
            settings,
            store: Arc::new(ConfigStore::new()),
            dispatcher: Arc::new(ChangeDispatcher::new()),
            state: Arc::new(Mutex::new(state)),
            coordinator: Arc::new(coordinator),
            restart_rx: std::sync::Mutex::new(Some(restart_rx)),
            backend,
            guards: std::sync::Mutex::new(Vec::new()),
            shutdown: std::sync::Mutex::new(Shutdown::new()),
            running: AtomicBool::new(false),
        })
    }

    /// Load every config file and publish the result. Returns the snapshot.
    pub async fn init(&self) -> Snapshot {
        self.state.lock().await.load_all(&self.store).await;
        self.store.all()
    }

    /// Register an observer for change events.
    pub fn watch<F>(&self, callback: F)
    where
        F: Fn(&WatchEvent) + Send + Sync + 'static,
    {
        self.dispatcher.subscribe(callback);
    }

    /// Load, wire the default logging/restart observer, and start watching
    /// the config and plugins directories.
    ///
    /// A directory that cannot be watched is reported to observers as an
    /// `error` event and left unwatched; startup carries on. Calling `start`
    /// again before [`HotConfig::stop`] returns the current snapshot.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(&self) -> Result<Snapshot, ConfigError> {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Config engine already started");
            return Ok(self.store.all());
        }

        let snapshot = self.init().await;

        let coordinator = self.coordinator.clone();
        self.watch(move |event| {
            match &event.error {
                Some(e) => tracing::error!(name = %event.changed_name, error = %e, "Failed to reload config"),
                None => tracing::info!(name = %event.changed_name, action = %event.action, "Config changed"),
            }
            coordinator.evaluate(RestartTrigger::Config(event));
        });

        let debounce = Duration::from_millis(self.settings.debounce_ms);
        let (config_shutdown, plugin_shutdown) = {
            let shutdown = self.shutdown.lock().unwrap_or_else(PoisonError::into_inner);
            (shutdown.subscribe(), shutdown.subscribe())
        };

        if self.settings.config_dir.is_dir() {
            if let Some(batches) = self.watch_dir(&self.settings.config_dir, debounce) {
                let watcher = ConfigDirWatcher {
                    state: self.state.clone(),
                    store: self.store.clone(),
                    dispatcher: self.dispatcher.clone(),
                };
                tokio::spawn(watcher.run(batches, config_shutdown));
            }
        } else {
            tracing::warn!(
                path = %self.settings.config_dir.display(),
                "Config directory does not exist, not watching"
            );
        }

        match &self.settings.plugins_dir {
            Some(dir) if dir.is_dir() => {
                if let Some(batches) = self.watch_dir(dir, debounce) {
                    let watcher = PluginDirWatcher {
                        dir: dir.clone(),
                        extensions: self.settings.plugin_extensions.clone(),
                        coordinator: self.coordinator.clone(),
                    };
                    tokio::spawn(watcher.run(batches, plugin_shutdown));
                }
            }
            Some(dir) => {
                tracing::warn!(path = %dir.display(), "Plugins directory does not exist, not watching");
            }
            None => {}
        }

        tracing::info!("Configs loaded: {}", self.list().join(", "));
        Ok(snapshot)
    }

    /// Detach watchers, drop subscribers and clear the store.
    ///
    /// A reload already in progress finishes, but its dispatch reaches nobody.
    pub fn stop(&self) {
        {
            let mut shutdown = self.shutdown.lock().unwrap_or_else(PoisonError::into_inner);
            shutdown.trigger();
            *shutdown = Shutdown::new();
        }
        self.guards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.dispatcher.clear();
        self.store.clear();
        self.coordinator.reset();
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Config engine stopped");
    }

    /// Take the restart request channel. Only the first caller gets it.
    pub fn take_restart_requests(&self) -> Option<mpsc::UnboundedReceiver<RestartRequest>> {
        self.restart_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.store.get(name)
    }

    pub fn get_path(&self, name: &str, path: &str) -> Option<Value> {
        self.store.get_path(name, path)
    }

    pub fn get_as<T: DeserializeOwned>(
        &self,
        name: &str,
        path: &str,
    ) -> Result<Option<T>, serde_json::Error> {
        self.store.get_as(name, path)
    }

    pub fn has(&self, name: &str) -> bool {
        self.store.has(name)
    }

    pub fn list(&self) -> Vec<String> {
        self.store.list()
    }

    pub fn all(&self) -> Snapshot {
        self.store.all()
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.settings.config_dir
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Register a watch on `dir`, keeping its guard. A failure is logged and
    /// dispatched as an `error` event named after the directory.
    fn watch_dir(&self, dir: &Path, debounce: Duration) -> Option<mpsc::UnboundedReceiver<FsBatch>> {
        match self.backend.watch_tree(dir, debounce) {
            Ok((guard, batches)) => {
                self.keep(guard);
                Some(batches)
            }
            Err(e) => {
                tracing::error!(path = %dir.display(), error = %e, "Failed to watch directory");
                self.dispatcher
                    .dispatch(&WatchEvent::error(dir.display().to_string(), e));
                None
            }
        }
    }

    fn keep(&self, guard: WatchGuard) {
        self.guards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(guard);
    }
}

impl std::fmt::Debug for HotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotConfig")
            .field("config_dir", &self.settings.config_dir)
            .field("plugins_dir", &self.settings.plugins_dir)
            .field("configs", &self.store.len())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}
