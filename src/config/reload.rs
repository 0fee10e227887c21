//! Full-directory load and single-file reload.
//!
//! # Data Flow
//! ```text
//! init():
//!     list config dir (top level, sorted)
//!     → loader.rs per file (failures logged, file skipped)
//!     → bases / overrides split by file name
//!     → overrides.rs merge per base
//!     → one atomic publish into the store
//!
//! file event for F:
//!     F gone?      → forget it, publish, Deleted (or Updated for the base
//!                    an override targeted)
//!     F override?  → reload, re-merge its target from the raw base
//!                    (sources keyed by path relative to the config dir)
//!     F base?      → reload, publish raw value (or re-merge if enabled)
//!     load failed  → Error event, store untouched
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::dispatch::WatchEvent;
use crate::config::loader::{is_config_file, load_file};
use crate::config::overrides::{self, OverrideSpec};
use crate::config::store::ConfigStore;
use crate::observability::metrics;

/// Parsed override file, kept so its target can be re-merged later.
///
/// `source` is the path relative to the config directory, so a top-level
/// override and one in a subdirectory compose instead of replacing each
/// other.
#[derive(Debug, Clone)]
struct OverrideSource {
    source: String,
    specs: Vec<OverrideSpec>,
}

/// Everything the reload path needs beyond the published store: raw base
/// values (before overrides) and the known override files per target.
#[derive(Debug)]
pub struct ReloadState {
    config_dir: PathBuf,
    canonical_dir: Option<PathBuf>,
    remerge_on_base_change: bool,
    bases: HashMap<String, Value>,
    overrides: HashMap<String, Vec<OverrideSource>>,
}

impl ReloadState {
    pub fn new(config_dir: impl Into<PathBuf>, remerge_on_base_change: bool) -> Self {
        Self {
            config_dir: config_dir.into(),
            canonical_dir: None,
            remerge_on_base_change,
            bases: HashMap::new(),
            overrides: HashMap::new(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Load every config file in the directory and publish the result in a
    /// single swap. A missing directory yields an empty store.
    pub async fn load_all(&mut self, store: &ConfigStore) {
        self.bases.clear();
        self.overrides.clear();
        self.canonical_dir = tokio::fs::canonicalize(&self.config_dir).await.ok();

        if !self.config_dir.is_dir() {
            tracing::warn!(path = %self.config_dir.display(), "Config directory does not exist");
            store.replace_all(BTreeMap::new());
            metrics::record_entries(0);
            return;
        }

        let files = match list_config_files(&self.config_dir).await {
            Ok(files) => files,
            Err(e) => {
                tracing::error!(path = %self.config_dir.display(), error = %e, "Failed to list config directory");
                store.replace_all(BTreeMap::new());
                metrics::record_entries(0);
                return;
            }
        };

        for (file_name, path) in files {
            let value = match load_file(&path).await {
                Ok(value) => value,
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Failed to load config");
                    metrics::record_load_failure();
                    continue;
                }
            };

            if overrides::is_override(&file_name) {
                tracing::info!(file = %file_name, "Loading override config file");
                match overrides::target_name(&file_name) {
                    // Top-level scan: the relative path is the file name.
                    Some(target) => self.upsert_override(target, file_name, &value),
                    None => tracing::warn!(file = %file_name, "Override file names no base, ignoring"),
                }
            } else {
                self.bases.insert(file_name, value);
            }
        }

        let resolved = self
            .bases
            .keys()
            .map(|name| (name.clone(), self.resolve(name)))
            .collect::<BTreeMap<_, _>>();

        for target in self.overrides.keys() {
            if !self.bases.contains_key(target) {
                tracing::debug!(target = %target, "Overrides target a base that is not loaded");
            }
        }

        metrics::record_entries(resolved.len());
        store.replace_all(resolved);
    }

    /// React to a filesystem change on `path`.
    ///
    /// Returns the event to dispatch, or `None` when nothing observable
    /// changed (irrelevant file, override for an unknown base).
    pub async fn handle_path(&mut self, path: &Path, store: &ConfigStore) -> Option<WatchEvent> {
        if !is_config_file(path) {
            return None;
        }
        let file_name = path.file_name()?.to_str()?.to_string();

        let event = if !path.exists() {
            let source = self.source_key(path);
            self.handle_removed(file_name, source, store)
        } else if overrides::is_override(&file_name) {
            let source = self.source_key(path);
            self.reload_override(path, file_name, source, store).await
        } else {
            Some(self.reload_base(path, file_name, store).await)
        };

        if let Some(event) = &event {
            metrics::record_reload(event.action.as_str());
            metrics::record_entries(store.len());
        }
        event
    }

    fn handle_removed(
        &mut self,
        file_name: String,
        source: String,
        store: &ConfigStore,
    ) -> Option<WatchEvent> {
        if overrides::is_override(&file_name) {
            let target = overrides::target_name(&file_name)?;
            let sources = self.overrides.get_mut(&target)?;
            let before = sources.len();
            sources.retain(|s| s.source != source);
            if sources.len() == before {
                return None;
            }
            if sources.is_empty() {
                self.overrides.remove(&target);
            }

            if !self.bases.contains_key(&target) {
                return None;
            }
            store.set(&target, self.resolve(&target));
            return Some(WatchEvent::updated(target, store.all()));
        }

        self.bases.remove(&file_name);
        store.remove(&file_name);
        Some(WatchEvent::deleted(file_name, store.all()))
    }

    async fn reload_override(
        &mut self,
        path: &Path,
        file_name: String,
        source: String,
        store: &ConfigStore,
    ) -> Option<WatchEvent> {
        let Some(target) = overrides::target_name(&file_name) else {
            tracing::warn!(file = %file_name, "Override file names no base, ignoring");
            return None;
        };

        let value = match load_file(path).await {
            Ok(value) => value,
            Err(e) => {
                metrics::record_load_failure();
                return Some(WatchEvent::error(file_name, e));
            }
        };

        self.upsert_override(target.clone(), source, &value);

        if !self.bases.contains_key(&target) {
            tracing::debug!(target = %target, "Override stored, base not loaded yet");
            return None;
        }
        store.set(&target, self.resolve(&target));
        Some(WatchEvent::updated(target, store.all()))
    }

    async fn reload_base(&mut self, path: &Path, file_name: String, store: &ConfigStore) -> WatchEvent {
        let value = match load_file(path).await {
            Ok(value) => value,
            Err(e) => {
                metrics::record_load_failure();
                return WatchEvent::error(file_name, e);
            }
        };

        self.bases.insert(file_name.clone(), value.clone());
        let stored = if self.remerge_on_base_change {
            self.resolve(&file_name)
        } else {
            value
        };
        store.set(&file_name, stored);
        WatchEvent::updated(file_name, store.all())
    }

    fn upsert_override(&mut self, target: String, source: String, content: &Value) {
        let specs = OverrideSpec::parse_all(content);
        let sources = self.overrides.entry(target).or_default();
        match sources.iter_mut().find(|s| s.source == source) {
            Some(existing) => existing.specs = specs,
            None => {
                sources.push(OverrideSource { source, specs });
                sources.sort_by(|a, b| a.source.cmp(&b.source));
            }
        }
    }

    /// `path` relative to the config directory. Watch backends may report
    /// canonical paths (macOS resolves `/var` to `/private/var`), so both
    /// forms of the root are tried.
    fn source_key(&self, path: &Path) -> String {
        let relative = path
            .strip_prefix(&self.config_dir)
            .ok()
            .or_else(|| {
                self.canonical_dir
                    .as_deref()
                    .and_then(|dir| path.strip_prefix(dir).ok())
            })
            .unwrap_or(path);
        relative.to_string_lossy().into_owned()
    }

    /// Raw base `name` with every known override applied in file order.
    fn resolve(&self, name: &str) -> Value {
        let base = self.bases.get(name).cloned().unwrap_or(Value::Null);
        match self.overrides.get(name) {
            Some(sources) => {
                let specs: Vec<OverrideSpec> = sources
                    .iter()
                    .flat_map(|s| s.specs.iter().cloned())
                    .collect();
                overrides::merge(&base, &specs)
            }
            None => base,
        }
    }
}

/// Top-level config files, sorted by file name.
async fn list_config_files(dir: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !is_config_file(&path) {
            continue;
        }
        // Follows symlinks; a dangling one is skipped.
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            files.push((name.to_string(), path.clone()));
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}
