//! # In-Memory Push Backend
//!
//! Scriptable [`NativePushBackend`] for tests and host-app previews.
//!
//! ## Features
//!
//! - **Call Recording**: every `init` call and its plugin configuration is kept
//! - **Event Injection**: emit registration, notification and error events on demand
//! - **Failure Simulation**: make `init` or `unregister` fail
//!
//! ```rust
//! use pushkit_core::backend::{InMemoryBackend, NativePushBackend, RegistrationData};
//! use pushkit_core::config::PluginConfig;
//!
//! let backend = InMemoryBackend::new();
//! let handle = backend.init(&PluginConfig::default()).unwrap();
//! handle.on_registration(std::sync::Arc::new(|data: &RegistrationData| {
//!     assert_eq!(data.registration_id, "tok-1");
//! }));
//!
//! assert_eq!(backend.emit_registration("tok-1"), 1);
//! assert_eq!(backend.init_count(), 1);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use super::{
    BackendError, BackendHandle, BackendHandler, NativePushBackend, Notification,
    RegistrationData, UnregisterFailure, UnregisterSuccess,
};
use crate::config::PluginConfig;
use crate::error::{PushError, PushResult};

#[derive(Default)]
struct InMemoryState {
    plugin_configs: Vec<PluginConfig>,
    handles: Vec<Arc<InMemoryHandle>>,
    init_failure: Option<String>,
    unregister_failure: Option<String>,
}

/// In-memory native backend
///
/// Events are delivered to the handle created by the most recent `init`.
#[derive(Default, Clone)]
pub struct InMemoryBackend {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `init` fail with `message`
    pub fn fail_init_with(&self, message: impl Into<String>) {
        self.state.lock().init_failure = Some(message.into());
    }

    /// Make every later `unregister` report `message` to its error callback
    pub fn fail_unregister_with(&self, message: impl Into<String>) {
        self.state.lock().unregister_failure = Some(message.into());
    }

    pub fn init_count(&self) -> usize {
        self.state.lock().plugin_configs.len()
    }

    pub fn plugin_configs(&self) -> Vec<PluginConfig> {
        self.state.lock().plugin_configs.clone()
    }

    pub fn latest_handle(&self) -> Option<Arc<InMemoryHandle>> {
        self.state.lock().handles.last().cloned()
    }

    /// Emit a `registration` event; returns the number of handlers reached
    pub fn emit_registration(&self, registration_id: impl Into<String>) -> usize {
        self.emit_registration_data(RegistrationData::new(registration_id))
    }

    pub fn emit_registration_data(&self, data: RegistrationData) -> usize {
        self.latest_handle()
            .map_or(0, |handle| handle.emit_registration(&data))
    }

    pub fn emit_notification(&self, raw: Value) -> usize {
        self.latest_handle()
            .map_or(0, |handle| handle.emit_notification(&Notification::new(raw)))
    }

    pub fn emit_error(&self, message: impl Into<String>) -> usize {
        let error = BackendError::new(message);
        self.latest_handle()
            .map_or(0, |handle| handle.emit_error(&error))
    }

    /// Total `unregister` calls across all handles
    pub fn unregister_count(&self) -> usize {
        self.state
            .lock()
            .handles
            .iter()
            .map(|handle| handle.unregister_calls.load(Ordering::SeqCst))
            .sum()
    }
}

impl NativePushBackend for InMemoryBackend {
    fn init(&self, plugin_config: &PluginConfig) -> PushResult<Arc<dyn BackendHandle>> {
        let mut state = self.state.lock();
        if let Some(message) = &state.init_failure {
            return Err(PushError::PluginUnavailable(message.clone()));
        }

        let handle = Arc::new(InMemoryHandle {
            registration: Mutex::new(Vec::new()),
            notification: Mutex::new(Vec::new()),
            error: Mutex::new(Vec::new()),
            unregister_calls: AtomicUsize::new(0),
            unregister_failure: state.unregister_failure.clone(),
        });
        state.plugin_configs.push(plugin_config.clone());
        state.handles.push(Arc::clone(&handle));

        debug!(init_count = state.handles.len(), "In-memory push backend initialized");
        Ok(handle)
    }
}

/// Plugin instance created by [`InMemoryBackend`]
pub struct InMemoryHandle {
    registration: Mutex<Vec<BackendHandler<RegistrationData>>>,
    notification: Mutex<Vec<BackendHandler<Notification>>>,
    error: Mutex<Vec<BackendHandler<BackendError>>>,
    unregister_calls: AtomicUsize,
    unregister_failure: Option<String>,
}

impl InMemoryHandle {
    pub fn emit_registration(&self, data: &RegistrationData) -> usize {
        dispatch(&self.registration, data)
    }

    pub fn emit_notification(&self, notification: &Notification) -> usize {
        dispatch(&self.notification, notification)
    }

    pub fn emit_error(&self, error: &BackendError) -> usize {
        dispatch(&self.error, error)
    }

    /// Handlers attached per channel: (registration, notification, error)
    pub fn listener_counts(&self) -> (usize, usize, usize) {
        (
            self.registration.lock().len(),
            self.notification.lock().len(),
            self.error.lock().len(),
        )
    }
}

fn dispatch<T>(channel: &Mutex<Vec<BackendHandler<T>>>, value: &T) -> usize {
    let handlers: Vec<_> = channel.lock().iter().cloned().collect();
    for handler in &handlers {
        handler(value);
    }
    handlers.len()
}

impl BackendHandle for InMemoryHandle {
    fn on_registration(&self, handler: BackendHandler<RegistrationData>) {
        self.registration.lock().push(handler);
    }

    fn on_notification(&self, handler: BackendHandler<Notification>) {
        self.notification.lock().push(handler);
    }

    fn on_error(&self, handler: BackendHandler<BackendError>) {
        self.error.lock().push(handler);
    }

    fn unregister(&self, on_success: UnregisterSuccess, on_error: UnregisterFailure) {
        self.unregister_calls.fetch_add(1, Ordering::SeqCst);
        match &self.unregister_failure {
            Some(message) => on_error(BackendError::new(message.clone())),
            None => on_success(),
        }
    }
}
