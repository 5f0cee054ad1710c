//! Readiness Gate
//!
//! Holds the configuration resolved by `init` and defers work until it
//! exists. `on_ready` is the only path by which `register` reaches a backend,
//! so no registration can start before configuration is in place.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, error, info};

use super::state::ReadinessState;
use super::PushCoordinator;
use crate::config::PushConfig;
use crate::constants::events::PUSH_READY;
use crate::error::{PushError, PushResult};
use crate::events::EventBus;
use crate::platform::Platform;

pub struct ReadinessGate {
    state: Arc<RwLock<ReadinessState>>,
    bus: Arc<EventBus>,
}

impl std::fmt::Debug for ReadinessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadinessGate")
            .field("state", &*self.state.read())
            .finish()
    }
}

impl ReadinessGate {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            state: Arc::new(RwLock::new(ReadinessState::default())),
            bus,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state.read().is_ready
    }

    pub fn config(&self) -> Option<Arc<PushConfig>> {
        self.state.read().config.clone()
    }

    pub fn snapshot(&self) -> ReadinessState {
        self.state.read().clone()
    }

    /// Store `config`, flip to ready and publish the ready event
    ///
    /// Calling this again replaces the configuration and publishes again.
    pub(crate) fn mark_ready(&self, config: PushConfig) {
        let summary = config.summary();
        {
            let mut state = self.state.write();
            state.config = Some(Arc::new(config));
            state.is_ready = true;
        }
        let delivered = self.bus.emit(PUSH_READY, summary);
        debug!(observers = delivered, "Push ready published");
    }

    /// Run `callback` now if ready, otherwise once the gate becomes ready
    pub fn on_ready<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            // Held across subscribe so a concurrent mark_ready cannot publish in between.
            let state = self.state.read();
            if !state.is_ready {
                self.defer(callback);
                return;
            }
        }
        callback();
    }

    fn defer<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let state = Arc::downgrade(&self.state);
        let bus = Arc::downgrade(&self.bus);
        let pending = Mutex::new(Some(callback));

        self.bus.once(PUSH_READY, move |_event| {
            let Some(callback) = pending.lock().take() else {
                return;
            };
            let (Some(state), Some(bus)) = (Weak::upgrade(&state), Weak::upgrade(&bus)) else {
                return;
            };
            let gate = ReadinessGate { state, bus };
            if gate.is_ready() {
                callback();
            } else {
                // Another coordinator on the shared bus became ready, not this one.
                debug!("Ready event from another coordinator; still waiting");
                gate.on_ready(callback);
            }
        });
    }
}

impl PushCoordinator {
    /// Resolve `config`, store it and publish the ready event
    ///
    /// `None` means an empty configuration. Returns `self` for chaining.
    /// Not guarded against repeated calls: a second `init` replaces the
    /// configuration and fires the ready event again.
    pub fn init(&self, config: Option<PushConfig>) -> PushResult<&Self> {
        self.ensure_active("init")?;
        let inner = &self.inner;
        let platform = inner.platform.platform();

        if !inner.dev_push && inner.native.is_none() {
            if platform.is_push_capable() {
                let err = PushError::PluginUnavailable(format!(
                    "no native push backend configured on {platform}"
                ));
                error!(error = %err, "Push init aborted");
                return Err(err);
            }
            info!(platform = %platform, "No native push backend; registration unavailable on this platform");
        }

        let mut config = config.unwrap_or_default();

        if platform == Platform::Android
            && !inner.dev_push
            && config.plugin_config.android_sender_id().is_none()
        {
            match inner.identity.sender_id() {
                Some(sender_id) => config.plugin_config.ensure_android_sender_id(sender_id),
                None => {
                    let err = PushError::MissingSenderId;
                    error!(error = %err, "Push init aborted");
                    return Err(err);
                }
            }
        }

        if let Some(callback) = config.on_register.clone() {
            inner.callbacks.set_register_callback(Some(callback))?;
        }
        if let Some(callback) = config.on_notification.clone() {
            inner.callbacks.set_notification_callback(Some(callback))?;
        }
        if let Some(callback) = config.on_error.clone() {
            inner.callbacks.set_error_callback(Some(callback))?;
        }

        crate::log_push!(info, "init",
            platform: platform,
            debug: config.debug,
            dev_push: inner.dev_push
        );

        inner.gate.mark_ready(config);
        Ok(self)
    }

    /// `init` from an untyped configuration value
    ///
    /// `null` behaves like `init(None)`; a non-object is rejected.
    pub fn init_from_value(&self, config: Value) -> PushResult<&Self> {
        self.ensure_active("init")?;
        let config = PushConfig::from_value(config).map_err(|err| {
            error!(error = %err, "Push init aborted");
            err
        })?;
        self.init(Some(config))
    }

    /// Run `callback` with this coordinator once `init` has completed
    ///
    /// Runs synchronously, before returning, if already ready.
    pub fn on_ready<F>(&self, callback: F) -> PushResult<()>
    where
        F: FnOnce(&PushCoordinator) + Send + 'static,
    {
        self.ensure_active("on_ready")?;
        let inner = Arc::downgrade(&self.inner);
        self.inner.gate.on_ready(move || {
            if let Some(inner) = inner.upgrade() {
                callback(&PushCoordinator::from_inner(inner));
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_on_ready_runs_immediately_when_ready() {
        let gate = ReadinessGate::new(Arc::new(EventBus::new()));
        gate.mark_ready(PushConfig::default());

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        gate.on_ready(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_on_ready_waits_for_mark_ready() {
        let bus = Arc::new(EventBus::new());
        let gate = ReadinessGate::new(Arc::clone(&bus));

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        gate.on_ready(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(bus.subscriber_count(PUSH_READY), 1);

        gate.mark_ready(PushConfig::default());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        gate.mark_ready(PushConfig::default());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_foreign_ready_event_rearms() {
        let bus = Arc::new(EventBus::new());
        let ours = ReadinessGate::new(Arc::clone(&bus));
        let theirs = ReadinessGate::new(Arc::clone(&bus));

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        ours.on_ready(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        theirs.mark_ready(PushConfig::default());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(bus.subscriber_count(PUSH_READY), 1);

        ours.mark_ready(PushConfig::default());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ready_event_carries_config_summary() {
        let bus = Arc::new(EventBus::new());
        let gate = ReadinessGate::new(Arc::clone(&bus));
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        bus.on(PUSH_READY, move |event| *slot.lock() = Some(event.payload.clone()));

        gate.mark_ready(PushConfig::new().with_debug(true));

        let payload = seen.lock().clone().unwrap();
        assert_eq!(payload["debug"], serde_json::json!(true));
        assert!(gate.snapshot().is_ready);
        assert!(gate.config().unwrap().debug);
    }
}
