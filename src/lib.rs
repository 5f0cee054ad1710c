#![allow(clippy::doc_markdown)] // Allow technical terms like FCM, APNs in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # PushKit Core
//!
//! Client-side coordinator for the lifecycle of device push-notification
//! registration.
//!
//! ## Overview
//!
//! The coordinator sits between a mobile application and the native push
//! registration library. It gates consumer calls behind an asynchronous
//! readiness state, keeps at most one registration attempt in flight,
//! dispatches registration, notification and error events to user-supplied
//! callbacks, and republishes "ready" and "notification processed" events on
//! a shared event bus for any number of later observers.
//!
//! ## Module Organization
//!
//! - [`coordinator`] - Readiness gate, registration, callbacks, notifications, user linkage
//! - [`backend`] - Native and developer backend traits plus in-memory implementations
//! - [`events`] - Named-event bus shared between coordinators and observers
//! - [`config`] - Per-init configuration and process-level settings loading
//! - [`platform`] - Platform detection and application identity
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup and macros
//!
//! ## Failure Model
//!
//! Nothing on the public surface panics. Configuration problems, a missing
//! plugin, a concurrent `register` or a rejected callback are logged and
//! returned as [`PushError`] values; backend runtime errors go to the error
//! callback. A missing plugin or bad configuration degrades push support
//! without taking the host application down.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use pushkit_core::backend::InMemoryBackend;
//! use pushkit_core::config::PushConfig;
//! use pushkit_core::coordinator::PushCoordinator;
//! use pushkit_core::platform::{AppIdentity, Platform, StaticPlatform};
//!
//! let backend = InMemoryBackend::new();
//! let push = PushCoordinator::builder(AppIdentity::new("app-id", "api-key").with_gcm_key("1234"))
//!     .platform(StaticPlatform(Platform::Android))
//!     .native_backend(Arc::new(backend.clone()))
//!     .build();
//!
//! push.init(Some(PushConfig::new().on_register(|data| {
//!     println!("registered: {}", data.registration_id);
//! })))
//! .unwrap();
//! push.register(None).unwrap();
//!
//! backend.emit_registration("fcm-token");
//! assert_eq!(push.token().unwrap().id(), "fcm-token");
//! ```

pub mod backend;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod logging;
pub mod platform;

pub use backend::{
    BackendError, BackendHandle, DevPushBackend, InMemoryBackend, NativePushBackend,
    Notification, RegistrationData, SimulatedDevBackend,
};
pub use config::{PluginConfig, PushConfig, PushSettings, SettingsLoader};
pub use coordinator::{
    PushCoordinator, PushCoordinatorBuilder, PushToken, RegistrationState, UserRecord,
};
pub use error::{PushError, PushResult};
pub use events::{BusEvent, EventBus};
pub use platform::{AppIdentity, Platform, PlatformDetector, StaticPlatform};
