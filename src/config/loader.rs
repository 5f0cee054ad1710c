//! Settings Loader
//!
//! Environment-aware loading of process-level push settings. Sources are
//! layered with the `config` crate: built-in defaults, then an optional
//! settings file (format inferred from its extension), then `PUSHKIT_*`
//! environment variables.

use super::error::{ConfigResult, ConfigurationError};
use crate::constants::{env as env_names, DEFAULT_BUS_CAPACITY};
use crate::platform::AppIdentity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Process-level settings for the push coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushSettings {
    /// Application id issued by the push service
    #[serde(default)]
    pub app_id: Option<String>,

    /// Public API key paired with `app_id`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Android sender / project number used when plugin config omits one
    #[serde(default)]
    pub gcm_key: Option<String>,

    /// Route registration through the simulated developer backend
    #[serde(default)]
    pub dev_push: bool,

    /// Default for `PushConfig::debug` when the host builds configs from settings
    #[serde(default)]
    pub debug: bool,

    /// Broadcast mirror capacity of a bus created from these settings
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

fn default_bus_capacity() -> usize {
    DEFAULT_BUS_CAPACITY
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            app_id: None,
            api_key: None,
            gcm_key: None,
            dev_push: false,
            debug: false,
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }
}

impl PushSettings {
    /// App identity handed to `PushCoordinator::builder`
    pub fn identity(&self) -> AppIdentity {
        AppIdentity {
            id: self.app_id.clone(),
            api_key: self.api_key.clone(),
            gcm_key: self.gcm_key.clone(),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.bus_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "bus_capacity",
                "0",
                "bus capacity must be at least 1",
            ));
        }
        Ok(())
    }

    /// JSON view with credentials masked, safe for log output
    pub fn sanitized(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        sanitize_json_recursive(&mut value, &["key", "secret", "token"]);
        value
    }
}

fn sanitize_json_recursive(value: &mut Value, sensitive_patterns: &[&str]) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                let key_lower = key.to_lowercase();
                let is_sensitive = sensitive_patterns
                    .iter()
                    .any(|pattern| key_lower.contains(pattern));

                if is_sensitive {
                    if let Value::String(s) = val {
                        *val = Value::String(format!("[MASKED: {}]", mask_secret(s)));
                    }
                } else {
                    sanitize_json_recursive(val, sensitive_patterns);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                sanitize_json_recursive(item, sensitive_patterns);
            }
        }
        _ => {}
    }
}

/// Keep two characters at each end of long secrets
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 4 {
        let head: String = chars[..2].iter().collect();
        let tail: String = chars[chars.len() - 2..].iter().collect();
        format!("{head}***{tail}")
    } else {
        "***".to_string()
    }
}

/// Layered settings loader
#[derive(Debug, Default)]
pub struct SettingsLoader {
    file: Option<PathBuf>,
    env_overrides: Option<HashMap<String, String>>,
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from this file in addition to the environment
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Use this map instead of the process environment
    ///
    /// Keys keep their `PUSHKIT_` prefix, e.g. `PUSHKIT_APP_ID`.
    pub fn with_env_overrides(mut self, vars: HashMap<String, String>) -> Self {
        self.env_overrides = Some(vars);
        self
    }

    /// Load with the file named by `PUSHKIT_SETTINGS`, if set
    pub fn from_env() -> ConfigResult<PushSettings> {
        let mut loader = Self::new();
        if let Ok(path) = env::var(env_names::SETTINGS_FILE) {
            loader = loader.with_file(path);
        }
        loader.load()
    }

    pub fn load(&self) -> ConfigResult<PushSettings> {
        let mut builder = ::config::Config::builder()
            .set_default("dev_push", false)?
            .set_default("debug", false)?
            .set_default("bus_capacity", DEFAULT_BUS_CAPACITY as i64)?;

        if let Some(path) = &self.file {
            ensure_exists(path)?;
            builder = builder.add_source(::config::File::from(path.as_path()).required(true));
        }

        let environment = ::config::Environment::with_prefix(env_names::SETTINGS_PREFIX)
            .try_parsing(true)
            .source(self.env_overrides.clone());
        builder = builder.add_source(environment);

        let settings: PushSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;

        debug!(
            settings = %settings.sanitized(),
            file = ?self.file,
            "Push settings loaded"
        );

        Ok(settings)
    }
}

fn ensure_exists(path: &Path) -> ConfigResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ConfigurationError::SettingsFileNotFound {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_mask_handles_multibyte_secrets() {
        assert_eq!(mask_secret("aé-secret-é"), "aé***-é");
        assert_eq!(mask_secret("ééé"), "***");
        assert_eq!(mask_secret("abcdef"), "ab***ef");

        let settings = PushSettings {
            api_key: Some("aé-secret-é".into()),
            ..PushSettings::default()
        };
        assert_eq!(
            settings.sanitized()["api_key"],
            Value::String("[MASKED: aé***-é]".into())
        );
    }

    #[test]
    fn test_load_with_multibyte_key_under_debug_logging() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        let env = HashMap::from([("PUSHKIT_API_KEY".to_string(), "aé-secret".to_string())]);

        let settings = tracing::subscriber::with_default(subscriber, || {
            SettingsLoader::new().with_env_overrides(env).load()
        })
        .unwrap();

        assert_eq!(settings.api_key.as_deref(), Some("aé-secret"));
    }

    #[test]
    fn test_defaults_without_sources() {
        let settings = SettingsLoader::new()
            .with_env_overrides(no_env())
            .load()
            .unwrap();
        assert_eq!(settings, PushSettings::default());
        assert!(settings.identity().validate().is_err());
    }

    #[test]
    fn test_file_then_env_layering() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "app_id = \"app-1\"\napi_key = \"file-key\"\ngcm_key = \"9876\"\nbus_capacity = 16"
        )
        .unwrap();

        let env = HashMap::from([
            ("PUSHKIT_API_KEY".to_string(), "env-key".to_string()),
            ("PUSHKIT_DEV_PUSH".to_string(), "true".to_string()),
        ]);

        let settings = SettingsLoader::new()
            .with_file(file.path())
            .with_env_overrides(env)
            .load()
            .unwrap();

        assert_eq!(settings.app_id.as_deref(), Some("app-1"));
        assert_eq!(settings.api_key.as_deref(), Some("env-key"));
        assert_eq!(settings.gcm_key.as_deref(), Some("9876"));
        assert!(settings.dev_push);
        assert_eq!(settings.bus_capacity, 16);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = SettingsLoader::new()
            .with_file("/nonexistent/pushkit.toml")
            .with_env_overrides(no_env())
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::SettingsFileNotFound { .. }));
    }

    #[test]
    fn test_zero_bus_capacity_rejected() {
        let env = HashMap::from([("PUSHKIT_BUS_CAPACITY".to_string(), "0".to_string())]);
        let err = SettingsLoader::new()
            .with_env_overrides(env)
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidValue { .. }));
    }

    #[test]
    fn test_sanitized_masks_credentials() {
        let settings = PushSettings {
            app_id: Some("app-1".into()),
            api_key: Some("abcdefgh".into()),
            gcm_key: Some("123".into()),
            ..Default::default()
        };
        let sanitized = settings.sanitized();
        assert_eq!(sanitized["app_id"], "app-1");
        assert_eq!(sanitized["api_key"], "[MASKED: ab***gh]");
        assert_eq!(sanitized["gcm_key"], "[MASKED: ***]");
    }
}
