//! # Structured Logging Module
//!
//! Environment-aware structured logging for the push coordinator. Hosts call
//! [`init_structured_logging`] once at startup; library code only emits
//! `tracing` events and never installs a subscriber on its own.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::constants::env;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize console logging with an environment-specific level
///
/// `RUST_LOG` wins over the environment default. Set `json = true` for
/// machine-readable output. Safe to call repeatedly and alongside a host
/// that already installed a global subscriber.
pub fn init_structured_logging(json: bool) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));

        let layer = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(filter)
                .boxed()
        };

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        } else {
            tracing::info!(environment = %environment, json, "Structured logging initialized");
        }
    });
}

/// Current environment from `PUSHKIT_ENV`, defaulting to development
fn get_environment() -> String {
    std::env::var(env::ENVIRONMENT).unwrap_or_else(|_| "development".to_string())
}

fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log a push lifecycle operation with structured fields
///
/// ```rust
/// pushkit_core::log_push!(info, "registered", token: "abc");
/// pushkit_core::log_push!(debug, "init");
/// ```
#[macro_export]
macro_rules! log_push {
    // Simple form - just operation
    ($level:ident, $operation:expr $(,)?) => {
        tracing::$level!(
            operation = %$operation,
            timestamp = %chrono::Utc::now().to_rfc3339(),
            "PUSH_{}", $operation
        );
    };
    // Generic form with additional fields
    ($level:ident, $operation:expr, $($key:ident: $value:expr),+ $(,)?) => {
        tracing::$level!(
            operation = %$operation,
            $($key = ?$value,)*
            timestamp = %chrono::Utc::now().to_rfc3339(),
            "PUSH_{}", $operation
        );
    };
}
