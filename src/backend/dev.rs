//! Simulated developer backend.
//!
//! Issues a random `DEV-` token instead of talking to a push service, and lets
//! a developer inject notifications as if they had arrived from the device.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::{DevPushBackend, Notification};
use crate::constants::DEV_TOKEN_PREFIX;
use crate::coordinator::PushCoordinator;
use crate::error::{PushError, PushResult};

#[derive(Default)]
pub struct SimulatedDevBackend {
    owner: Mutex<Option<Weak<crate::coordinator::CoordinatorInner>>>,
    issued: Mutex<Vec<String>>,
}

impl SimulatedDevBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens issued so far, oldest first
    pub fn issued_tokens(&self) -> Vec<String> {
        self.issued.lock().clone()
    }

    /// Deliver a notification to the coordinator that last registered here
    pub fn simulate_notification(&self, raw: Value) -> PushResult<()> {
        let owner = self
            .owner
            .lock()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(PushCoordinator::from_inner);

        match owner {
            Some(coordinator) => {
                coordinator.deliver_notification(Notification::new(raw));
                Ok(())
            }
            None => {
                warn!("Simulated notification dropped: no coordinator registered with the dev backend");
                Err(PushError::NotRegistered)
            }
        }
    }
}

impl DevPushBackend for SimulatedDevBackend {
    fn init(&self, coordinator: &PushCoordinator) {
        let token = format!("{DEV_TOKEN_PREFIX}{}", Uuid::new_v4());
        info!(token = %token, "Simulated dev push registration");

        *self.owner.lock() = Some(Arc::downgrade(coordinator.inner()));
        self.issued.lock().push(token.clone());
        coordinator.accept_dev_token(token);
    }
}
