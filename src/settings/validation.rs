//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (debounce > 0) and addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceSettings → Result<(), Vec<ValidationError>>
//! - Runs before settings are accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::settings::schema::ServiceSettings;

pub const LOG_FORMATS: &[&str] = &["full", "compact", "pretty"];

/// A single semantic problem with the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_settings(settings: &ServiceSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.engine.config_dir.as_os_str().is_empty() {
        errors.push(ValidationError::new("engine.config_dir", "must not be empty"));
    }
    if settings.engine.debounce_ms == 0 {
        errors.push(ValidationError::new("engine.debounce_ms", "must be greater than 0"));
    }
    if settings.engine.plugin_extensions.iter().any(|e| e.starts_with('.')) {
        errors.push(ValidationError::new(
            "engine.plugin_extensions",
            "extensions are given without the leading dot",
        ));
    }

    if settings.admin.enabled {
        if settings.admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "admin.bind_address",
                format!("invalid socket address {:?}", settings.admin.bind_address),
            ));
        }
        if settings.admin.api_key.trim().is_empty() {
            errors.push(ValidationError::new("admin.api_key", "must not be empty"));
        }
    }

    if settings.observability.metrics_enabled
        && settings.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address {:?}", settings.observability.metrics_address),
        ));
    }
    if !LOG_FORMATS.contains(&settings.observability.log_format.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("expected one of {}", LOG_FORMATS.join(", ")),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_settings(&ServiceSettings::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut settings = ServiceSettings::default();
        settings.engine.config_dir = PathBuf::new();
        settings.engine.debounce_ms = 0;
        settings.admin.enabled = true;
        settings.admin.bind_address = "nowhere".into();
        settings.admin.api_key = " ".into();
        settings.observability.log_format = "xml".into();

        let errors = validate_settings(&settings).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "engine.config_dir",
                "engine.debounce_ms",
                "admin.bind_address",
                "admin.api_key",
                "observability.log_format",
            ]
        );
    }

    #[test]
    fn test_disabled_admin_not_checked() {
        let mut settings = ServiceSettings::default();
        settings.admin.bind_address = "nowhere".into();
        assert!(validate_settings(&settings).is_ok());
    }
}
