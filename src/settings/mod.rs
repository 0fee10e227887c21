//! Service settings.
//!
//! # Data Flow
//! ```text
//! hot-config.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → ServiceSettings handed to the engine, admin API and observability
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal or absent settings files
//! - These settings are read once at startup; the watched config directory
//!   is the engine's business, not this module's

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_settings, SettingsError};
pub use schema::{AdminConfig, EngineSettings, ObservabilityConfig, ServiceSettings};
pub use validation::{validate_settings, ValidationError};
