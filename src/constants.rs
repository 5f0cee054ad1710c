//! # Push Coordinator Constants
//!
//! Event names, platform tags and environment variable names shared by the
//! coordinator, the event bus and the settings loader.

/// Event bus event names published by the coordinator
pub mod events {
    /// Published by `init` once configuration is resolved; carries the config summary
    pub const PUSH_READY: &str = "push.ready";
    /// Published after an inbound notification has been recorded; carries the raw notification
    pub const NOTIFICATION_PROCESSED: &str = "push.notification_processed";
}

/// Backend channel names, used in log output
pub mod backend_events {
    pub const REGISTRATION: &str = "registration";
    pub const NOTIFICATION: &str = "notification";
    pub const ERROR: &str = "error";
}

/// Platform discriminators passed to `UserRecord::add_push_token`
pub mod platform_tags {
    pub const ANDROID: &str = "android";
    pub const IOS: &str = "ios";
}

/// Environment variables consulted by logging and settings
pub mod env {
    /// Runtime environment name (`development`, `test`, `production`)
    pub const ENVIRONMENT: &str = "PUSHKIT_ENV";
    /// Optional path of a settings file
    pub const SETTINGS_FILE: &str = "PUSHKIT_SETTINGS";
    /// Prefix for per-field settings overrides, e.g. `PUSHKIT_APP_ID`
    pub const SETTINGS_PREFIX: &str = "PUSHKIT";
}

/// Prefix of tokens issued by the simulated developer backend
pub const DEV_TOKEN_PREFIX: &str = "DEV-";

/// Default capacity of the event bus broadcast mirror
pub const DEFAULT_BUS_CAPACITY: usize = 256;
