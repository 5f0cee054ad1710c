//! Coordinators built from layered settings, driven through the developer backend.

mod common;

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use pushkit_core::constants::{events::NOTIFICATION_PROCESSED, DEV_TOKEN_PREFIX};
use pushkit_core::{
    Platform, PushConfig, PushCoordinator, SettingsLoader, SimulatedDevBackend, StaticPlatform,
};
use serde_json::json;

use common::RecordingUser;

fn write_settings(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_dev_push_from_settings_issues_dev_token() {
    let file = write_settings("app_id = \"app-1\"\napi_key = \"k\"\ndev_push = true\n");
    let settings = SettingsLoader::new()
        .with_file(file.path())
        .with_env_overrides(HashMap::new())
        .load()
        .unwrap();

    let dev = Arc::new(SimulatedDevBackend::new());
    let push = PushCoordinator::builder_from_settings(&settings)
        .platform(StaticPlatform(Platform::Ios))
        .dev_backend(Arc::clone(&dev) as Arc<dyn pushkit_core::DevPushBackend>)
        .build();

    push.init(None).unwrap().register(None).unwrap();

    let token = push.token().unwrap();
    assert!(token.id().starts_with(DEV_TOKEN_PREFIX));
    assert_eq!(dev.issued_tokens(), vec![token.id().to_string()]);
    assert!(push.is_token_ready());
    assert!(!push.is_registering());

    let mut user = RecordingUser::default();
    push.add_token_to_user(&mut user).unwrap();
    assert_eq!(user.tokens, vec![(token.id().to_string(), "ios".to_string())]);
}

#[test]
fn test_simulated_notification_reaches_callback_and_bus() {
    let file = write_settings("app_id = \"app-1\"\napi_key = \"k\"\n");
    let env = HashMap::from([("PUSHKIT_DEV_PUSH".to_string(), "true".to_string())]);
    let settings = SettingsLoader::new()
        .with_file(file.path())
        .with_env_overrides(env)
        .load()
        .unwrap();
    assert!(settings.dev_push);

    let dev = Arc::new(SimulatedDevBackend::new());
    let push = PushCoordinator::builder_from_settings(&settings)
        .platform(StaticPlatform(Platform::Android))
        .dev_backend(Arc::clone(&dev) as Arc<dyn pushkit_core::DevPushBackend>)
        .build();

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    push.init(Some(PushConfig::new().on_notification(move |notification| {
        sink.lock().push(notification.payload());
    })))
    .unwrap();
    push.register(None).unwrap();

    let mut observer = push.bus().subscribe();
    dev.simulate_notification(json!({"additionalData": {"payload": {"kind": "ping"}}}))
        .unwrap();

    assert_eq!(*received.lock(), vec![json!({"kind": "ping"})]);
    let event = tokio_test::block_on(observer.recv()).unwrap();
    assert_eq!(event.name, NOTIFICATION_PROCESSED);
}

#[test]
fn test_simulated_notification_without_registration_is_dropped() {
    let dev = SimulatedDevBackend::new();
    assert!(dev.simulate_notification(json!({"message": "hi"})).is_err());
}
