//! Restart policy.
//!
//! Decides, per change, whether the hosting process must restart to pick the
//! change up. The decision is emitted as a [`RestartRequest`] on a channel;
//! acting on it (draining, exiting with the agreed code) belongs to the host,
//! see `lifecycle::restart`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::config::dispatch::{ChangeAction, WatchEvent};

/// What caused a restart decision to be evaluated.
#[derive(Debug, Clone, Copy)]
pub enum RestartTrigger<'a> {
    /// An event from the config directory watcher.
    Config(&'a WatchEvent),
    /// A relevant file changed in the plugins directory.
    Plugin(&'a Path),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartReason {
    ConfigUpdated { name: String },
    PluginChanged { path: PathBuf },
}

impl RestartReason {
    pub fn label(&self) -> &'static str {
        match self {
            RestartReason::ConfigUpdated { .. } => "config",
            RestartReason::PluginChanged { .. } => "plugin",
        }
    }
}

impl fmt::Display for RestartReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestartReason::ConfigUpdated { name } => write!(f, "config \"{}\" updated", name),
            RestartReason::PluginChanged { path } => {
                write!(f, "plugin file {} changed", path.display())
            }
        }
    }
}

/// Signal to the host that the process should restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartRequest {
    pub reason: RestartReason,
}

/// Applies the restart policy and emits at most one [`RestartRequest`].
#[derive(Debug)]
pub struct RestartCoordinator {
    restart_on_update: bool,
    tx: mpsc::UnboundedSender<RestartRequest>,
    requested: AtomicBool,
}

impl RestartCoordinator {
    pub fn new(restart_on_update: bool) -> (Self, mpsc::UnboundedReceiver<RestartRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                restart_on_update,
                tx,
                requested: AtomicBool::new(false),
            },
            rx,
        )
    }

    /// Policy only, no side effects.
    pub fn should_restart(&self, trigger: RestartTrigger<'_>) -> bool {
        match trigger {
            RestartTrigger::Config(event) => {
                self.restart_on_update && event.action == ChangeAction::Updated
            }
            RestartTrigger::Plugin(_) => true,
        }
    }

    /// Apply the policy and, the first time it fires, send the request.
    ///
    /// Returns whether the policy fired for this trigger.
    pub fn evaluate(&self, trigger: RestartTrigger<'_>) -> bool {
        if !self.should_restart(trigger) {
            return false;
        }

        let reason = match trigger {
            RestartTrigger::Config(event) => RestartReason::ConfigUpdated {
                name: event.changed_name.clone(),
            },
            RestartTrigger::Plugin(path) => RestartReason::PluginChanged {
                path: path.to_path_buf(),
            },
        };

        if self.requested.swap(true, Ordering::SeqCst) {
            tracing::debug!(reason = %reason, "Restart already requested");
            return true;
        }

        tracing::info!(reason = %reason, "Restarting application due to change");
        crate::observability::metrics::record_restart_request(reason.label());
        if self.tx.send(RestartRequest { reason }).is_err() {
            tracing::warn!("Restart requested but no host is listening");
        }
        true
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Re-arm after the engine is stopped so a later start can request again.
    pub fn reset(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }
}
