//! # Push Backends
//!
//! Boundary traits for the subsystems that talk to the OS-level push service.
//!
//! - [`NativePushBackend`]: the native plugin. `init` yields a [`BackendHandle`]
//!   whose three typed channels (registration, notification, error) the
//!   coordinator subscribes to once per registration cycle.
//! - [`DevPushBackend`]: a developer/simulation path that bypasses the native
//!   plugin and feeds a token straight into the coordinator.
//!
//! [`InMemoryBackend`] and [`SimulatedDevBackend`] are ready-made
//! implementations for tests, previews and development builds.

pub mod dev;
pub mod in_memory;
pub mod types;

use std::sync::Arc;

use crate::config::PluginConfig;
use crate::coordinator::PushCoordinator;
use crate::error::PushResult;

pub use dev::SimulatedDevBackend;
pub use in_memory::{InMemoryBackend, InMemoryHandle};
pub use types::{BackendError, Notification, RegistrationData};

/// Handler for one backend event channel
pub type BackendHandler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Invoked when the backend confirms unregistration
pub type UnregisterSuccess = Box<dyn FnOnce() + Send>;

/// Invoked when the backend fails to unregister
pub type UnregisterFailure = Box<dyn FnOnce(BackendError) + Send>;

/// Native push registration library
pub trait NativePushBackend: Send + Sync {
    /// Start a registration cycle with the resolved plugin configuration
    fn init(&self, plugin_config: &PluginConfig) -> PushResult<Arc<dyn BackendHandle>>;
}

/// Live plugin instance returned by [`NativePushBackend::init`]
pub trait BackendHandle: Send + Sync {
    fn on_registration(&self, handler: BackendHandler<RegistrationData>);

    fn on_notification(&self, handler: BackendHandler<Notification>);

    fn on_error(&self, handler: BackendHandler<BackendError>);

    /// Ask the push service to forget this device. Exactly one of the
    /// callbacks is invoked, possibly later.
    fn unregister(&self, on_success: UnregisterSuccess, on_error: UnregisterFailure);
}

/// Developer/simulation registration path
pub trait DevPushBackend: Send + Sync {
    /// Register on behalf of `coordinator`, typically through
    /// [`PushCoordinator::accept_dev_token`]
    fn init(&self, coordinator: &PushCoordinator);
}
