//! Change event fan-out.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::error::ConfigError;
use crate::config::store::Snapshot;

/// What happened to a config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Updated,
    Deleted,
    Error,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Updated => "updated",
            ChangeAction::Deleted => "deleted",
            ChangeAction::Error => "error",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event delivered to every observer after a reload attempt.
#[derive(Debug, Clone)]
pub struct WatchEvent {
    /// Set only for [`ChangeAction::Error`].
    pub error: Option<Arc<ConfigError>>,
    /// Full store contents after the change; `None` on error.
    pub snapshot: Option<Snapshot>,
    pub changed_name: String,
    pub action: ChangeAction,
}

impl WatchEvent {
    pub fn updated(changed_name: impl Into<String>, snapshot: Snapshot) -> Self {
        Self {
            error: None,
            snapshot: Some(snapshot),
            changed_name: changed_name.into(),
            action: ChangeAction::Updated,
        }
    }

    pub fn deleted(changed_name: impl Into<String>, snapshot: Snapshot) -> Self {
        Self {
            error: None,
            snapshot: Some(snapshot),
            changed_name: changed_name.into(),
            action: ChangeAction::Deleted,
        }
    }

    pub fn error(changed_name: impl Into<String>, error: ConfigError) -> Self {
        Self {
            error: Some(Arc::new(error)),
            snapshot: None,
            changed_name: changed_name.into(),
            action: ChangeAction::Error,
        }
    }
}

/// Observer callback.
pub type Observer = Arc<dyn Fn(&WatchEvent) + Send + Sync>;

/// Fan-out of [`WatchEvent`]s to all registered observers.
///
/// Observers run on the dispatching task, in registration order. A panicking
/// observer is not caught.
#[derive(Default)]
pub struct ChangeDispatcher {
    observers: RwLock<Vec<Observer>>,
}

impl ChangeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(&WatchEvent) + Send + Sync + 'static,
    {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(observer));
    }

    pub fn dispatch(&self, event: &WatchEvent) {
        // Snapshot the list so observers may subscribe from inside a callback.
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer(event);
        }
    }

    pub fn clear(&self) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl fmt::Debug for ChangeDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeDispatcher")
            .field("observers", &self.observer_count())
            .finish()
    }
}
