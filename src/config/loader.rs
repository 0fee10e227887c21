//! Configuration loading from disk.
//!
//! One file in, one [`serde_json::Value`] out. The format is picked from the
//! file extension; nothing is cached, so every call observes the bytes that
//! are on disk right now.

use std::path::Path;

use serde_json::{Map, Number, Value};

use crate::config::error::{ConfigError, LoadFailure};

/// Formats the engine knows how to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Map a file extension (without the dot, any case) to a format.
    ///
    /// Script modules (`js`, `mjs`) are deliberately absent: configuration is
    /// data, never code.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// Format of `path`, if its extension is recognised.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse raw file bytes in this format.
    pub fn parse(self, bytes: &[u8]) -> Result<Value, LoadFailure> {
        match self {
            ConfigFormat::Json => Ok(serde_json::from_slice(bytes)?),
            ConfigFormat::Yaml => Ok(serde_yaml::from_slice(bytes)?),
            ConfigFormat::Toml => {
                let text = String::from_utf8_lossy(bytes);
                let table: toml::Value = toml::from_str(&text)?;
                Ok(toml_to_json(table))
            }
        }
    }
}

/// Whether the directory scan and the config watcher should consider `path`.
pub fn is_config_file(path: &Path) -> bool {
    ConfigFormat::from_path(path).is_some()
}

/// Read and deserialize a single configuration file.
pub async fn load_file(path: &Path) -> Result<Value, ConfigError> {
    let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
        path: path.to_path_buf(),
        extension: path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default(),
    })?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ConfigError::load(path, e))?;

    format.parse(&bytes).map_err(|e| ConfigError::load(path, e))
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect::<Map<String, Value>>(),
        ),
    }
}
