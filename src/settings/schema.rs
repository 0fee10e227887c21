//! Service settings schema.
//!
//! This module defines the settings file of the service itself (where the
//! config directory lives, restart policy, admin API, logging). All types
//! derive Serde traits for deserialization from TOML.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceSettings {
    /// Configuration engine settings.
    pub engine: EngineSettings,

    /// Admin read API.
    pub admin: AdminConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Configuration engine settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Directory holding the watched configuration files.
    pub config_dir: PathBuf,

    /// Optional plugins directory; any relevant change there restarts.
    pub plugins_dir: Option<PathBuf>,

    /// Request a restart whenever a config is updated.
    pub restart_on_update: bool,

    /// Re-apply known overrides when a base file is edited live.
    pub remerge_on_base_change: bool,

    /// Debounce window for filesystem events in milliseconds.
    pub debounce_ms: u64,

    /// Time given to in-flight work between a restart request and exit.
    pub restart_drain_ms: u64,

    /// Extensions (without dot) that count as plugin files.
    pub plugin_extensions: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("./config"),
            plugins_dir: Some(PathBuf::from("./plugins")),
            restart_on_update: false,
            remerge_on_base_change: false,
            debounce_ms: 100,
            restart_drain_ms: 500,
            plugin_extensions: ["js", "mjs", "json", "yaml", "yml", "toml", "html", "css"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format: full, compact or pretty.
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "full".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
