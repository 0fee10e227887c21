//! Error types for the configuration engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, merging or watching configuration files.
///
/// File-level variants are recoverable: the offending file is skipped and
/// everything else keeps loading. Only [`ConfigError::MissingDirectoryPath`]
/// is fatal, and only at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File unreadable or malformed for its declared format.
    #[error("failed to load {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: LoadFailure,
    },

    /// Extension outside the recognised set.
    #[error("unsupported config file type {extension:?}: {}", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The filesystem watch backend failed or reported an error.
    #[error("watch error on {}: {message}", path.display())]
    Watch { path: PathBuf, message: String },

    /// No config directory was given at construction.
    #[error("config directory path is empty")]
    MissingDirectoryPath,
}

/// Underlying cause of a [`ConfigError::Load`].
#[derive(Debug, Error)]
pub enum LoadFailure {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ConfigError {
    pub(crate) fn load(path: impl Into<PathBuf>, source: impl Into<LoadFailure>) -> Self {
        Self::Load {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn watch(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Watch {
            path: path.into(),
            message: message.into(),
        }
    }
}
