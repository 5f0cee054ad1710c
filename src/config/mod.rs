//! # Push Configuration
//!
//! Two layers of configuration feed the coordinator:
//!
//! - [`PushSettings`]: process-level settings (app identity, developer-backend
//!   switch, bus capacity) loaded once by [`SettingsLoader`] from an optional
//!   file plus `PUSHKIT_*` environment overrides.
//! - [`PushConfig`]: the per-`init` record carrying the debug flag, the three
//!   optional lifecycle callbacks and the opaque native plugin configuration.
//!
//! ## Usage
//!
//! ```rust
//! use pushkit_core::config::PushConfig;
//! use serde_json::json;
//!
//! let config = PushConfig::from_value(json!({
//!     "debug": true,
//!     "pluginConfig": { "android": { "senderId": "1234" }, "ios": { "badge": true } }
//! }))
//! .unwrap();
//!
//! assert!(config.debug);
//! assert_eq!(config.plugin_config.android_sender_id(), Some("1234"));
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use tracing::error;

use crate::backend::{BackendError, Notification, RegistrationData};
use crate::coordinator::callbacks::{ErrorCallback, NotificationCallback, RegisterCallback};
use crate::error::{PushError, PushResult};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::{PushSettings, SettingsLoader};

/// Configuration passed to `PushCoordinator::init`
///
/// Stored by value once `init` resolves it, so later changes to the caller's
/// copy never reach coordinator state.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushConfig {
    /// Log every backend event verbatim
    #[serde(default)]
    pub debug: bool,

    #[serde(skip)]
    pub on_register: Option<RegisterCallback>,

    #[serde(skip)]
    pub on_notification: Option<NotificationCallback>,

    #[serde(skip)]
    pub on_error: Option<ErrorCallback>,

    /// Native plugin configuration, opaque apart from the Android sender id
    #[serde(default)]
    pub plugin_config: PluginConfig,
}

impl fmt::Debug for PushConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushConfig")
            .field("debug", &self.debug)
            .field("on_register", &self.on_register.is_some())
            .field("on_notification", &self.on_notification.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("plugin_config", &self.plugin_config)
            .finish()
    }
}

const CALLBACK_KEYS: [(&str, &str); 3] = [
    ("onRegister", "register"),
    ("onNotification", "notification"),
    ("onError", "error"),
];

impl PushConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an untyped configuration value
    ///
    /// `null` means "no configuration" and yields the defaults. Anything other
    /// than an object is rejected. Callback keys cannot carry invocable values
    /// in JSON, so they are reported and dropped.
    pub fn from_value(value: Value) -> PushResult<Self> {
        let object = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(object) => object,
            other => {
                return Err(PushError::InvalidConfig(format!(
                    "init configuration must be an object, got {}",
                    json_kind(&other)
                )))
            }
        };

        for (key, slot) in CALLBACK_KEYS {
            if object.contains_key(key) {
                error!(
                    key,
                    error = %PushError::CallbackType { slot },
                    "Ignoring non-invocable callback in configuration"
                );
            }
        }

        Ok(serde_json::from_value(Value::Object(object))?)
    }

    /// Defaults seeded from process settings (currently the debug switch)
    pub fn from_settings(settings: &PushSettings) -> Self {
        Self::new().with_debug(settings.debug)
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_plugin_config(mut self, plugin_config: PluginConfig) -> Self {
        self.plugin_config = plugin_config;
        self
    }

    pub fn on_register<F>(mut self, callback: F) -> Self
    where
        F: Fn(&RegistrationData) + Send + Sync + 'static,
    {
        self.on_register = Some(std::sync::Arc::new(callback));
        self
    }

    pub fn on_notification<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.on_notification = Some(std::sync::Arc::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&BackendError) + Send + Sync + 'static,
    {
        self.on_error = Some(std::sync::Arc::new(callback));
        self
    }

    /// JSON view published with the "ready" event
    pub fn summary(&self) -> Value {
        json!({
            "debug": self.debug,
            "pluginConfig": self.plugin_config,
            "callbacks": {
                "onRegister": self.on_register.is_some(),
                "onNotification": self.on_notification.is_some(),
                "onError": self.on_error.is_some(),
            }
        })
    }
}

/// Native plugin configuration blob
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidPluginConfig>,

    /// Every other platform section, passed through untouched
    #[serde(flatten)]
    pub platforms: Map<String, Value>,
}

impl PluginConfig {
    pub fn android_sender_id(&self) -> Option<&str> {
        self.android
            .as_ref()
            .and_then(|android| android.sender_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// Fill the Android sender id if it is not already set
    pub fn ensure_android_sender_id(&mut self, sender_id: impl Into<String>) {
        let android = self.android.get_or_insert_with(AndroidPluginConfig::default);
        if android.sender_id.as_deref().map_or(true, str::is_empty) {
            android.sender_id = Some(sender_id.into());
        }
    }

    /// Section for a platform other than Android
    pub fn platform(&self, name: &str) -> Option<&Value> {
        self.platforms.get(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidPluginConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_yields_defaults() {
        let config = PushConfig::from_value(Value::Null).unwrap();
        assert!(!config.debug);
        assert_eq!(config.plugin_config, PluginConfig::default());
    }

    #[test]
    fn test_non_object_is_rejected() {
        for value in [json!("debug"), json!(42), json!([1, 2]), json!(true)] {
            let err = PushConfig::from_value(value).unwrap_err();
            assert!(matches!(err, PushError::InvalidConfig(_)));
        }
    }

    #[test]
    fn test_plugin_config_passthrough() {
        let config = PushConfig::from_value(json!({
            "pluginConfig": {
                "android": { "senderId": "42", "icon": "push" },
                "ios": { "alert": true, "sound": false }
            }
        }))
        .unwrap();

        assert_eq!(config.plugin_config.android_sender_id(), Some("42"));
        let android = config.plugin_config.android.as_ref().unwrap();
        assert_eq!(android.extra.get("icon"), Some(&json!("push")));
        assert_eq!(
            config.plugin_config.platform("ios"),
            Some(&json!({"alert": true, "sound": false}))
        );
    }

    #[test]
    fn test_callback_keys_are_dropped() {
        let config = PushConfig::from_value(json!({"onRegister": "not a function"})).unwrap();
        assert!(config.on_register.is_none());
    }

    #[test]
    fn test_ensure_sender_id_keeps_existing_value() {
        let mut plugin = PluginConfig::default();
        plugin.ensure_android_sender_id("from-identity");
        assert_eq!(plugin.android_sender_id(), Some("from-identity"));

        plugin.ensure_android_sender_id("other");
        assert_eq!(plugin.android_sender_id(), Some("from-identity"));
    }

    #[test]
    fn test_from_settings_carries_debug() {
        let settings = PushSettings {
            debug: true,
            ..PushSettings::default()
        };
        assert!(PushConfig::from_settings(&settings).debug);
        assert!(!PushConfig::from_settings(&PushSettings::default()).debug);
    }

    #[test]
    fn test_summary_reports_callback_presence() {
        let config = PushConfig::new().with_debug(true).on_error(|_| {});
        let summary = config.summary();
        assert_eq!(summary["debug"], json!(true));
        assert_eq!(summary["callbacks"]["onError"], json!(true));
        assert_eq!(summary["callbacks"]["onRegister"], json!(false));
    }
}
