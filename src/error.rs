//! Error types for the push coordinator.
//!
//! Every public operation returns these as values. Nothing on the public
//! surface panics; callers detect failure by checking the `Result`.

use crate::config::ConfigurationError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PushError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Missing app identity field: {0}")]
    MissingIdentity(&'static str),
    #[error("Android sender id not found; set pluginConfig.android.senderId or the app gcm key")]
    MissingSenderId,
    #[error("Push plugin unavailable: {0}")]
    PluginUnavailable(String),
    #[error("Another registration is already in progress")]
    ConcurrentRegistration,
    #[error("Callback type error: {slot} callback is not invocable")]
    CallbackType { slot: &'static str },
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Push coordinator is inactive: {0}")]
    Inactive(String),
    #[error("No push plugin instance exists yet; call register() first")]
    NotRegistered,
    #[error("No device token is held")]
    NoToken,
    #[error("Unsupported platform for {operation}: {platform}")]
    UnsupportedPlatform {
        operation: &'static str,
        platform: String,
    },
}

impl PushError {
    /// Whether the failure comes from bad or missing configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::InvalidConfig(_)
                | Self::MissingIdentity(_)
                | Self::MissingSenderId
        )
    }
}

impl From<ConfigurationError> for PushError {
    fn from(error: ConfigurationError) -> Self {
        PushError::Configuration(error.to_string())
    }
}

impl From<serde_json::Error> for PushError {
    fn from(error: serde_json::Error) -> Self {
        PushError::InvalidConfig(format!("JSON deserialization error: {error}"))
    }
}

pub type PushResult<T> = std::result::Result<T, PushError>;
