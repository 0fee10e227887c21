//! Settings loading from disk.

use std::fs;
use std::path::Path;

use crate::settings::schema::ServiceSettings;
use crate::settings::validation::ValidationError;

/// Error type for settings loading.
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "IO error: {}", e),
            SettingsError::Parse(e) => write!(f, "Parse error: {}", e),
            SettingsError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for SettingsError {}

/// Parse settings from a TOML string. Not validated.
pub fn parse_settings(content: &str) -> Result<ServiceSettings, SettingsError> {
    toml::from_str(content).map_err(SettingsError::Parse)
}

/// Load settings from a TOML file. Not validated, so callers can apply
/// command-line overrides before running
/// [`validate_settings`](crate::settings::validate_settings).
pub fn load_settings(path: &Path) -> Result<ServiceSettings, SettingsError> {
    let content = fs::read_to_string(path).map_err(SettingsError::Io)?;
    parse_settings(&content)
}
