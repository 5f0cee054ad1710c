//! Shared fixtures for push coordinator integration tests.

use std::sync::Arc;

use pushkit_core::{
    AppIdentity, EventBus, InMemoryBackend, Platform, PushCoordinator, StaticPlatform, UserRecord,
};

/// User record that remembers every token association it receives
#[derive(Debug, Default)]
pub struct RecordingUser {
    pub tokens: Vec<(String, String)>,
}

impl UserRecord for RecordingUser {
    fn add_push_token(&mut self, token: &str, platform_tag: &str) {
        self.tokens
            .push((token.to_string(), platform_tag.to_string()));
    }
}

/// Coordinator wired to a fresh in-memory backend
pub struct Harness {
    pub push: PushCoordinator,
    pub backend: InMemoryBackend,
    pub bus: Arc<EventBus>,
}

impl Harness {
    pub fn new(platform: Platform) -> Self {
        Self::with_identity(platform, AppIdentity::new("A", "K").with_gcm_key("1234"))
    }

    pub fn with_identity(platform: Platform, identity: AppIdentity) -> Self {
        let backend = InMemoryBackend::new();
        let bus = Arc::new(EventBus::new());
        let push = PushCoordinator::builder(identity)
            .platform(StaticPlatform(platform))
            .bus(Arc::clone(&bus))
            .native_backend(Arc::new(backend.clone()))
            .build();
        Self { push, backend, bus }
    }
}
