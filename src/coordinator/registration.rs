//! Registration Coordinator
//!
//! Runs at most one registration attempt at a time against the native backend
//! (or the developer backend) and owns the current device token.
//!
//! The exclusivity lock is taken by `register` and released exactly once per
//! attempt: by the backend's registration event, by the developer backend
//! completing, or straight away if the attempt is rejected before reaching a
//! backend. There is no timeout; a backend that never answers keeps the lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::callbacks::TokenCallback;
use super::state::RegistrationState;
use super::PushCoordinator;
use crate::backend::{
    BackendError, BackendHandle, Notification, RegistrationData, UnregisterFailure,
    UnregisterSuccess,
};
use crate::config::PushConfig;
use crate::constants::backend_events;
use crate::error::{PushError, PushResult};

/// Device registration identifier issued by the push service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushToken {
    id: String,
    issued_at: DateTime<Utc>,
}

impl PushToken {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            issued_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

impl std::fmt::Display for PushToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

/// Single-flight guard for registration attempts
#[derive(Debug, Default)]
pub struct RegistrationLock(AtomicBool);

impl RegistrationLock {
    /// Take the lock; false if an attempt is already in flight
    pub fn try_acquire(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_held(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Default)]
pub struct RegistrationCoordinator {
    lock: RegistrationLock,
    token: RwLock<Option<PushToken>>,
    token_ready: AtomicBool,
    plugin: RwLock<Option<Arc<dyn BackendHandle>>>,
}

impl std::fmt::Debug for RegistrationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationCoordinator")
            .field("lock", &self.lock)
            .field("token", &*self.token.read())
            .field("token_ready", &self.token_ready.load(Ordering::Acquire))
            .field("has_plugin", &self.plugin.read().is_some())
            .finish()
    }
}

impl RegistrationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> &RegistrationLock {
        &self.lock
    }

    /// Replace the current token (last write wins)
    pub fn store_token(&self, id: impl Into<String>) -> PushToken {
        let token = PushToken::new(id);
        *self.token.write() = Some(token.clone());
        token
    }

    pub fn token(&self) -> Option<PushToken> {
        self.token.read().clone()
    }

    pub fn mark_token_ready(&self) {
        self.token_ready.store(true, Ordering::Release);
    }

    pub fn is_token_ready(&self) -> bool {
        self.token_ready.load(Ordering::Acquire)
    }

    pub fn plugin(&self) -> Option<Arc<dyn BackendHandle>> {
        self.plugin.read().clone()
    }

    fn set_plugin(&self, handle: Arc<dyn BackendHandle>) {
        *self.plugin.write() = Some(handle);
    }

    pub fn state(&self) -> RegistrationState {
        if self.lock.is_held() {
            RegistrationState::Registering
        } else if self.is_token_ready() {
            RegistrationState::Registered
        } else {
            RegistrationState::Idle
        }
    }
}

impl PushCoordinator {
    /// Start a registration attempt
    ///
    /// Fails straight away with `ConcurrentRegistration` if one is in flight.
    /// Otherwise the attempt waits for readiness, then runs against the
    /// backend. `callback` receives the token each time the backend reports
    /// one for this attempt, in addition to the persisted register callback.
    pub fn register(&self, callback: Option<TokenCallback>) -> PushResult<()> {
        self.ensure_active("register")?;

        if !self.inner.registration.lock.try_acquire() {
            info!("Push registration already in progress; register() ignored");
            return Err(PushError::ConcurrentRegistration);
        }
        debug!(ready = self.inner.gate.is_ready(), "Registration lock acquired");

        let inner = Arc::downgrade(&self.inner);
        self.inner.gate.on_ready(move || {
            if let Some(inner) = inner.upgrade() {
                PushCoordinator::from_inner(inner).run_registration(callback);
            }
        });
        Ok(())
    }

    /// Ask the backend to unregister this device
    ///
    /// Requires a plugin instance from an earlier `register`. The outcome is
    /// reported through the callbacks, possibly later.
    pub fn unregister(
        &self,
        on_success: Option<UnregisterSuccess>,
        on_error: Option<UnregisterFailure>,
    ) -> PushResult<()> {
        self.ensure_active("unregister")?;

        let Some(plugin) = self.inner.registration.plugin() else {
            info!("No push plugin instance; unregister() ignored");
            return Err(PushError::NotRegistered);
        };

        let on_success: UnregisterSuccess = match on_success {
            Some(callback) => callback,
            None => Box::new(|| debug!("Push unregistered")),
        };
        let on_error: UnregisterFailure = match on_error {
            Some(callback) => callback,
            None => Box::new(|err: BackendError| warn!(error = %err, "Push unregister failed")),
        };
        plugin.unregister(on_success, on_error);
        Ok(())
    }

    /// Token hand-off for developer backends
    pub fn accept_dev_token(&self, id: impl Into<String>) -> PushToken {
        let token = self.inner.registration.store_token(id);
        crate::log_push!(info, "dev_token_accepted", token: token.id());
        token
    }

    fn run_registration(&self, callback: Option<TokenCallback>) {
        let registration = &self.inner.registration;

        let Some(config) = self.inner.gate.config() else {
            registration.lock.release();
            error!("Registration ran without configuration; lock released");
            return;
        };

        if self.inner.dev_push {
            self.inner.dev.init(self);
            registration.lock.release();
            registration.mark_token_ready();
            debug!("Developer push registration complete");
            return;
        }

        if let Err(err) = self.register_with_native(&config, callback) {
            registration.lock.release();
            error!(error = %err, "Push registration aborted");
        }
    }

    fn register_with_native(
        &self,
        config: &PushConfig,
        callback: Option<TokenCallback>,
    ) -> PushResult<()> {
        let native = self.inner.native.clone().ok_or_else(|| {
            PushError::PluginUnavailable(format!(
                "no native push backend on {}",
                self.inner.platform.platform()
            ))
        })?;

        let handle = native.init(&config.plugin_config)?;
        self.inner.registration.set_plugin(Arc::clone(&handle));
        self.subscribe_backend(handle.as_ref(), config.debug, callback);
        Ok(())
    }

    /// Attach one handler per backend channel for this registration cycle
    fn subscribe_backend(
        &self,
        handle: &dyn BackendHandle,
        debug: bool,
        callback: Option<TokenCallback>,
    ) {
        let inner = Arc::downgrade(&self.inner);
        handle.on_registration(Arc::new(move |data: &RegistrationData| {
            if let Some(inner) = inner.upgrade() {
                PushCoordinator::from_inner(inner).handle_registration(data, callback.as_ref(), debug);
            }
        }));

        let inner = Arc::downgrade(&self.inner);
        handle.on_notification(Arc::new(move |notification: &Notification| {
            if let Some(inner) = inner.upgrade() {
                let coordinator = PushCoordinator::from_inner(inner);
                if debug {
                    info!(event = backend_events::NOTIFICATION, data = %notification.raw(), "Push backend event");
                }
                coordinator.deliver_notification(notification.clone());
            }
        }));

        let inner = Arc::downgrade(&self.inner);
        handle.on_error(Arc::new(move |error: &BackendError| {
            if let Some(inner) = inner.upgrade() {
                PushCoordinator::from_inner(inner).handle_backend_error(error, debug);
            }
        }));
    }

    fn handle_registration(
        &self,
        data: &RegistrationData,
        callback: Option<&TokenCallback>,
        debug: bool,
    ) {
        let registration = &self.inner.registration;
        registration.lock.release();
        let token = registration.store_token(data.registration_id.clone());
        registration.mark_token_ready();

        if debug {
            info!(event = backend_events::REGISTRATION, data = %data.to_value(), "Push backend event");
        }
        crate::log_push!(info, "registered", token: token.id());

        if let Some(callback) = callback {
            callback(&token);
        }
        if let Some(on_register) = self.inner.callbacks.register_callback() {
            on_register(data);
        }
    }

    fn handle_backend_error(&self, error: &BackendError, debug: bool) {
        if debug {
            info!(event = backend_events::ERROR, error = %error, details = ?error.details, "Push backend event");
        }
        match self.inner.callbacks.error_callback() {
            Some(on_error) => on_error(error),
            None => warn!(error = %error, "Push backend error with no error callback"),
        }
    }
}
