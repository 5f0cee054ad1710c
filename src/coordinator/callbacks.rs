//! Callback Registry: one optional slot each for the registration,
//! notification and error lifecycle callbacks.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error};

use super::registration::PushToken;
use crate::backend::{BackendError, Notification, RegistrationData};
use crate::error::{PushError, PushResult};

/// Persisted callback receiving the raw backend registration data
pub type RegisterCallback = Arc<dyn Fn(&RegistrationData) + Send + Sync>;

pub type NotificationCallback = Arc<dyn Fn(&Notification) + Send + Sync>;

pub type ErrorCallback = Arc<dyn Fn(&BackendError) + Send + Sync>;

/// Per-call callback handed to `register`, receiving the new token
pub type TokenCallback = Arc<dyn Fn(&PushToken) + Send + Sync>;

#[derive(Default)]
pub struct CallbackRegistry {
    on_register: RwLock<Option<RegisterCallback>>,
    on_notification: RwLock<Option<NotificationCallback>>,
    on_error: RwLock<Option<ErrorCallback>>,
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("on_register", &self.on_register.read().is_some())
            .field("on_notification", &self.on_notification.read().is_some())
            .field("on_error", &self.on_error.read().is_some())
            .finish()
    }
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the registration callback. `None` is not invocable: it is
    /// rejected and the current slot is kept.
    pub fn set_register_callback(&self, callback: Option<RegisterCallback>) -> PushResult<()> {
        store(&self.on_register, callback, "register")
    }

    pub fn set_notification_callback(
        &self,
        callback: Option<NotificationCallback>,
    ) -> PushResult<()> {
        store(&self.on_notification, callback, "notification")
    }

    pub fn set_error_callback(&self, callback: Option<ErrorCallback>) -> PushResult<()> {
        store(&self.on_error, callback, "error")
    }

    pub(crate) fn register_callback(&self) -> Option<RegisterCallback> {
        self.on_register.read().clone()
    }

    pub(crate) fn notification_callback(&self) -> Option<NotificationCallback> {
        self.on_notification.read().clone()
    }

    pub(crate) fn error_callback(&self) -> Option<ErrorCallback> {
        self.on_error.read().clone()
    }
}

fn store<T>(slot: &RwLock<Option<T>>, callback: Option<T>, name: &'static str) -> PushResult<()> {
    match callback {
        Some(callback) => {
            *slot.write() = Some(callback);
            debug!(slot = name, "Push callback stored");
            Ok(())
        }
        None => {
            let err = PushError::CallbackType { slot: name };
            error!(error = %err, "Rejected push callback");
            Err(err)
        }
    }
}
