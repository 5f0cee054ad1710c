//! # Push Coordinator Module
//!
//! The [`PushCoordinator`] gates every consumer call behind readiness, runs at
//! most one registration at a time and fans backend events out to callbacks
//! and bus observers.
//!
//! ## Key Components
//!
//! - [`readiness`] - Readiness Gate: `init` and `on_ready`
//! - [`registration`] - Registration Coordinator: `register`, `unregister`, token slot
//! - [`callbacks`] - Callback Registry for the persisted lifecycle callbacks
//! - [`notification`] - Notification Processor and payload extraction
//! - [`linkage`] - Token/User linkage
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use pushkit_core::backend::InMemoryBackend;
//! use pushkit_core::config::PushConfig;
//! use pushkit_core::coordinator::PushCoordinator;
//! use pushkit_core::platform::{AppIdentity, Platform, StaticPlatform};
//!
//! let backend = InMemoryBackend::new();
//! let push = PushCoordinator::builder(AppIdentity::new("app-id", "api-key"))
//!     .platform(StaticPlatform(Platform::Ios))
//!     .native_backend(Arc::new(backend.clone()))
//!     .build();
//!
//! push.register(None).unwrap();
//! push.init(Some(PushConfig::new().with_debug(true))).unwrap();
//!
//! backend.emit_registration("device-token");
//! assert_eq!(push.token().unwrap().id(), "device-token");
//! ```

pub mod callbacks;
pub mod linkage;
pub mod notification;
pub mod readiness;
pub mod registration;
pub mod state;


use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::backend::{
    DevPushBackend, NativePushBackend, Notification, SimulatedDevBackend,
};
use crate::config::{PushConfig, PushSettings};
use crate::error::{PushError, PushResult};
use crate::events::EventBus;
use crate::platform::{AppIdentity, Platform, PlatformDetector, StaticPlatform};

pub use callbacks::{
    CallbackRegistry, ErrorCallback, NotificationCallback, RegisterCallback, TokenCallback,
};
pub use linkage::UserRecord;
pub use notification::{get_payload, NotificationProcessor};
pub use readiness::ReadinessGate;
pub use registration::{PushToken, RegistrationCoordinator, RegistrationLock};
pub use state::{ReadinessState, RegistrationState};

/// Client-side coordinator for device push registration
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct PushCoordinator {
    inner: Arc<CoordinatorInner>,
}

pub(crate) struct CoordinatorInner {
    /// Correlates log lines of one coordinator instance
    id: Uuid,
    identity: AppIdentity,
    /// False when construction found the app identity incomplete
    active: bool,
    platform: Arc<dyn PlatformDetector>,
    /// Shared, process-wide; never owned by the coordinator
    bus: Arc<EventBus>,
    native: Option<Arc<dyn NativePushBackend>>,
    dev: Arc<dyn DevPushBackend>,
    dev_push: bool,
    gate: ReadinessGate,
    callbacks: CallbackRegistry,
    registration: RegistrationCoordinator,
    notifications: NotificationProcessor,
}

impl std::fmt::Debug for PushCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = &self.inner;
        f.debug_struct("PushCoordinator")
            .field("id", &inner.id)
            .field("active", &inner.active)
            .field("platform", &inner.platform.platform())
            .field("dev_push", &inner.dev_push)
            .field("gate", &inner.gate)
            .field("registration", &inner.registration)
            .finish()
    }
}

/// Builder for [`PushCoordinator`]
pub struct PushCoordinatorBuilder {
    identity: AppIdentity,
    platform: Option<Arc<dyn PlatformDetector>>,
    bus: Option<Arc<EventBus>>,
    native: Option<Arc<dyn NativePushBackend>>,
    dev: Option<Arc<dyn DevPushBackend>>,
    dev_push: bool,
}

impl PushCoordinatorBuilder {
    pub fn platform(mut self, platform: impl PlatformDetector + 'static) -> Self {
        self.platform = Some(Arc::new(platform));
        self
    }

    /// Share an existing bus; a private bus is created otherwise
    pub fn bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn native_backend(mut self, backend: Arc<dyn NativePushBackend>) -> Self {
        self.native = Some(backend);
        self
    }

    /// Developer backend used when `dev_push` is on; defaults to [`SimulatedDevBackend`]
    pub fn dev_backend(mut self, backend: Arc<dyn DevPushBackend>) -> Self {
        self.dev = Some(backend);
        self
    }

    pub fn dev_push(mut self, enabled: bool) -> Self {
        self.dev_push = enabled;
        self
    }

    /// Build the coordinator
    ///
    /// Never fails. An incomplete app identity is logged once and yields an
    /// inert coordinator on which every operation returns `Inactive`.
    pub fn build(self) -> PushCoordinator {
        let id = Uuid::new_v4();
        let active = match self.identity.validate() {
            Ok(()) => true,
            Err(err) => {
                error!(coordinator = %id, error = %err, "Push coordinator disabled: app identity incomplete");
                false
            }
        };

        let bus = self.bus.unwrap_or_else(|| Arc::new(EventBus::new()));
        let platform = self
            .platform
            .unwrap_or_else(|| Arc::new(StaticPlatform::current()));

        if active {
            info!(
                coordinator = %id,
                platform = %platform.platform(),
                dev_push = self.dev_push,
                native_backend = self.native.is_some(),
                "Push coordinator created"
            );
        }

        PushCoordinator {
            inner: Arc::new(CoordinatorInner {
                id,
                identity: self.identity,
                active,
                platform,
                gate: ReadinessGate::new(Arc::clone(&bus)),
                notifications: NotificationProcessor::new(Arc::clone(&bus)),
                bus,
                native: self.native,
                dev: self
                    .dev
                    .unwrap_or_else(|| Arc::new(SimulatedDevBackend::new())),
                dev_push: self.dev_push,
                callbacks: CallbackRegistry::new(),
                registration: RegistrationCoordinator::new(),
            }),
        }
    }
}

impl PushCoordinator {
    pub fn builder(identity: AppIdentity) -> PushCoordinatorBuilder {
        PushCoordinatorBuilder {
            identity,
            platform: None,
            bus: None,
            native: None,
            dev: None,
            dev_push: false,
        }
    }

    /// Builder seeded from loaded settings: identity, developer switch and a
    /// private bus sized to `bus_capacity`
    pub fn builder_from_settings(settings: &PushSettings) -> PushCoordinatorBuilder {
        Self::builder(settings.identity())
            .dev_push(settings.dev_push)
            .bus(Arc::new(EventBus::with_capacity(settings.bus_capacity)))
    }

    pub(crate) fn from_inner(inner: Arc<CoordinatorInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Arc<CoordinatorInner> {
        &self.inner
    }

    fn ensure_active(&self, operation: &'static str) -> PushResult<()> {
        if self.inner.active {
            Ok(())
        } else {
            debug!(coordinator = %self.inner.id, operation, "Ignored call on inactive push coordinator");
            Err(PushError::Inactive(format!(
                "{operation} unavailable: app identity incomplete"
            )))
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn is_active(&self) -> bool {
        self.inner.active
    }

    pub fn platform(&self) -> Platform {
        self.inner.platform.platform()
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.inner.bus
    }

    pub fn is_ready(&self) -> bool {
        self.inner.gate.is_ready()
    }

    /// Configuration stored by the latest `init`
    pub fn config(&self) -> Option<Arc<PushConfig>> {
        self.inner.gate.config()
    }

    pub fn readiness(&self) -> ReadinessState {
        self.inner.gate.snapshot()
    }

    pub fn token(&self) -> Option<PushToken> {
        self.inner.registration.token()
    }

    pub fn is_token_ready(&self) -> bool {
        self.inner.registration.is_token_ready()
    }

    pub fn is_registering(&self) -> bool {
        self.inner.registration.lock().is_held()
    }

    pub fn registration_state(&self) -> RegistrationState {
        self.inner.registration.state()
    }

    pub fn set_register_callback(&self, callback: Option<RegisterCallback>) -> PushResult<()> {
        self.ensure_active("set_register_callback")?;
        self.inner.callbacks.set_register_callback(callback)
    }

    pub fn set_notification_callback(
        &self,
        callback: Option<NotificationCallback>,
    ) -> PushResult<()> {
        self.ensure_active("set_notification_callback")?;
        self.inner.callbacks.set_notification_callback(callback)
    }

    pub fn set_error_callback(&self, callback: Option<ErrorCallback>) -> PushResult<()> {
        self.ensure_active("set_error_callback")?;
        self.inner.callbacks.set_error_callback(callback)
    }

    /// Record `notification` and publish it as "notification processed"
    pub fn process_notification(&self, notification: &Notification) -> PushResult<()> {
        self.ensure_active("process_notification")?;
        self.inner.notifications.process_notification(notification);
        Ok(())
    }

    pub fn last_notification(&self) -> Option<Notification> {
        self.inner.notifications.last_notification()
    }

    /// `additionalData.payload` of a notification-shaped value, or `{}`
    pub fn get_payload(notification: &Value) -> Value {
        get_payload(notification)
    }

    /// Associate the held token with `user` under this platform's tag
    pub fn add_token_to_user(&self, user: &mut dyn UserRecord) -> PushResult<()> {
        self.ensure_active("add_token_to_user")?;
        let token = self.token();
        linkage::add_token_to_user(token.as_ref(), self.platform(), user)
    }

    /// Route an inbound notification: record, publish, then notify the callback
    pub(crate) fn deliver_notification(&self, notification: Notification) {
        self.inner.notifications.process_notification(&notification);
        if let Some(on_notification) = self.inner.callbacks.notification_callback() {
            on_notification(&notification);
        }
    }
}
