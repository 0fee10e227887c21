//! Shared utilities for engine integration tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hot_config::config::{ConfigError, FsBatch, HotConfig, WatchEvent, WatchGuard, WatchTree};
use hot_config::settings::EngineSettings;
use tokio::sync::mpsc;

/// Watch backend driven by hand: tests decide which batches arrive.
#[derive(Default)]
pub struct ManualWatch {
    senders: Mutex<HashMap<PathBuf, mpsc::UnboundedSender<FsBatch>>>,
}

impl WatchTree for ManualWatch {
    fn watch_tree(
        &self,
        root: &Path,
        _debounce: Duration,
    ) -> Result<(WatchGuard, mpsc::UnboundedReceiver<FsBatch>), ConfigError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().unwrap().insert(root.to_path_buf(), tx);
        Ok((Box::new(()), rx))
    }
}

impl ManualWatch {
    /// Report `paths` as changed under `root`.
    pub fn emit(&self, root: &Path, paths: &[PathBuf]) {
        if let Some(tx) = self.senders.lock().unwrap().get(root) {
            let _ = tx.send(Ok(paths.to_vec()));
        }
    }

    /// Report a backend failure under `root`.
    pub fn fail(&self, root: &Path, message: &str) {
        if let Some(tx) = self.senders.lock().unwrap().get(root) {
            let _ = tx.send(Err(ConfigError::Watch {
                path: root.to_path_buf(),
                message: message.to_string(),
            }));
        }
    }

    #[allow(dead_code)]
    pub fn is_watching(&self, root: &Path) -> bool {
        self.senders.lock().unwrap().contains_key(root)
    }
}

/// Watch backend that refuses every registration.
#[allow(dead_code)]
pub struct FailingWatch {
    message: String,
}

#[allow(dead_code)]
impl FailingWatch {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl WatchTree for FailingWatch {
    fn watch_tree(
        &self,
        root: &Path,
        _debounce: Duration,
    ) -> Result<(WatchGuard, mpsc::UnboundedReceiver<FsBatch>), ConfigError> {
        Err(ConfigError::Watch {
            path: root.to_path_buf(),
            message: self.message.clone(),
        })
    }
}

pub fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

pub fn settings(config_dir: &Path) -> EngineSettings {
    EngineSettings {
        config_dir: config_dir.to_path_buf(),
        plugins_dir: None,
        debounce_ms: 50,
        restart_drain_ms: 0,
        ..EngineSettings::default()
    }
}

/// Engine on a manual backend plus a channel receiving every event.
pub async fn start_manual(
    settings: EngineSettings,
) -> (Arc<ManualWatch>, HotConfig, mpsc::UnboundedReceiver<WatchEvent>) {
    let backend = Arc::new(ManualWatch::default());
    let engine = HotConfig::with_watch_backend(settings, backend.clone()).unwrap();
    engine.start().await.unwrap();
    let events = subscribe(&engine);
    (backend, engine, events)
}

pub fn subscribe(engine: &HotConfig) -> mpsc::UnboundedReceiver<WatchEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    engine.watch(move |event: &WatchEvent| {
        let _ = tx.send(event.clone());
    });
    rx
}

pub async fn next_event(
    rx: &mut mpsc::UnboundedReceiver<WatchEvent>,
    timeout: Duration,
) -> Option<WatchEvent> {
    tokio::time::timeout(timeout, rx.recv()).await.ok().flatten()
}
