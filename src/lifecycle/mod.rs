//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     broadcast → watcher loops and admin server stop
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → engine.stop() → shutdown → exit 0
//!
//! Restart (restart.rs):
//!     RestartRequest → engine.stop() → shutdown → drain → exit 42
//! ```
//!
//! # Design Decisions
//! - Restart is decided by the engine but executed here, behind an exit hook
//! - Drain window is bounded; in-flight work past it is lost

pub mod restart;
pub mod shutdown;
pub mod signals;

pub use restart::{ExitHook, ProcessExit, RestartHandler, RESTART_EXIT_CODE};
pub use shutdown::Shutdown;
