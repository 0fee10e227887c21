//! Resolved configuration store.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Immutable name → value view of every loaded config.
pub type Snapshot = Arc<BTreeMap<String, Value>>;

/// Owns the resolved name → value mapping.
///
/// Readers get a consistent snapshot without locking; the reload path is the
/// only writer and publishes a new map on every change.
#[derive(Debug, Default)]
pub struct ConfigStore {
    inner: ArcSwap<BTreeMap<String, Value>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whole value stored under `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.inner.load().get(name).cloned()
    }

    /// Value at a dotted `path` inside the config `name`.
    ///
    /// `get_path("mqtt.yaml", "broker.host")`. An empty path returns the whole
    /// value.
    pub fn get_path(&self, name: &str, path: &str) -> Option<Value> {
        let snapshot = self.inner.load();
        lookup_path(snapshot.get(name)?, path).cloned()
    }

    /// Deserialize the value (or the value at `path`) into `T`.
    ///
    /// `Ok(None)` when nothing is stored there.
    pub fn get_as<T: DeserializeOwned>(
        &self,
        name: &str,
        path: &str,
    ) -> Result<Option<T>, serde_json::Error> {
        self.get_path(name, path)
            .map(serde_json::from_value)
            .transpose()
    }

    pub fn has(&self, name: &str) -> bool {
        self.inner.load().contains_key(name)
    }

    /// Names of all stored configs, sorted.
    pub fn list(&self) -> Vec<String> {
        self.inner.load().keys().cloned().collect()
    }

    /// Current snapshot.
    pub fn all(&self) -> Snapshot {
        self.inner.load_full()
    }

    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn set(&self, name: &str, value: Value) {
        self.inner.rcu(|current| {
            let mut next = BTreeMap::clone(current);
            next.insert(name.to_string(), value.clone());
            next
        });
    }

    pub(crate) fn remove(&self, name: &str) -> bool {
        let mut removed = false;
        self.inner.rcu(|current| {
            let mut next = BTreeMap::clone(current);
            removed = next.remove(name).is_some();
            next
        });
        removed
    }

    /// Publish a complete map in one swap.
    pub(crate) fn replace_all(&self, configs: BTreeMap<String, Value>) {
        self.inner.store(Arc::new(configs));
    }

    pub(crate) fn clear(&self) {
        self.inner.store(Arc::new(BTreeMap::new()));
    }
}

/// Walk `path` segment by segment through nested mappings.
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.')
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}
