//! Hot-reloading configuration service for the home-automation dashboard.
//!
//! The engine ([`config::HotConfig`]) loads a directory of JSON/YAML/TOML
//! configs, folds `-surcharge` override files into their bases, watches the
//! directory for changes and tells observers what changed. Consumers only
//! need the read API (`get`, `get_path`, `has`, `list`, `all`) and `watch`.

pub mod admin;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod settings;

pub use config::HotConfig;
pub use lifecycle::{Shutdown, RESTART_EXIT_CODE};
pub use settings::ServiceSettings;
