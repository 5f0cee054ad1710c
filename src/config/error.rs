//! Configuration Error Types
//!
//! Errors raised while loading process-level push settings.

use std::path::PathBuf;
use thiserror::Error;

/// Settings-loading errors with enough context to act on
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Settings file configured but not present
    #[error("Settings file not found: {path}")]
    SettingsFileNotFound { path: PathBuf },

    /// The `config` crate failed to read or merge a source
    #[error("Failed to load settings: {error}")]
    LoadError { error: String },

    /// Merged sources did not deserialize into `PushSettings`
    #[error("Invalid settings: {error}")]
    DeserializeError { error: String },

    /// Invalid value for a field
    #[error("Invalid value '{value}' for field '{field}': {context}")]
    InvalidValue {
        field: String,
        value: String,
        context: String,
    },
}

impl ConfigurationError {
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            context: context.into(),
        }
    }
}

impl From<::config::ConfigError> for ConfigurationError {
    fn from(error: ::config::ConfigError) -> Self {
        match error {
            ::config::ConfigError::Type { .. } | ::config::ConfigError::Message(_) => {
                Self::DeserializeError {
                    error: error.to_string(),
                }
            }
            other => Self::LoadError {
                error: other.to_string(),
            },
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
