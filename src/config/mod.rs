//! Hot-reloading configuration engine.
//!
//! # Data Flow
//! ```text
//! config dir (JSON / YAML / TOML, base + `-surcharge` files)
//!     → loader.rs (one file → serde_json::Value)
//!     → overrides.rs (patch base sequences)
//!     → store.rs (atomic publish, lock-free reads)
//!
//! On file change:
//!     watcher.rs receives a debounced batch
//!     → reload.rs reloads the single affected file
//!     → store.rs publishes the new snapshot
//!     → dispatch.rs notifies every observer
//!     → restart.rs may emit a RestartRequest to the host
//!
//! On plugin dir change:
//!     watcher.rs → restart.rs (always)
//! ```
//!
//! # Design Decisions
//! - No partial state: the initial load publishes everything in one swap
//! - File-level failures are logged and isolated, never fatal
//! - Each file reloads independently; no multi-file transactions
//! - Restart is a request to the host, not a process exit

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod loader;
pub mod overrides;
pub mod reload;
pub mod restart;
pub mod store;
pub mod watcher;

pub use dispatch::{ChangeAction, ChangeDispatcher, WatchEvent};
pub use engine::HotConfig;
pub use error::{ConfigError, LoadFailure};
pub use loader::ConfigFormat;
pub use overrides::OverrideSpec;
pub use restart::{RestartCoordinator, RestartReason, RestartRequest, RestartTrigger};
pub use store::{ConfigStore, Snapshot};
pub use watcher::{FsBatch, NotifyWatchTree, WatchGuard, WatchTree};
