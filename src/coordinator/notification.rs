//! Notification Processor
//!
//! Keeps the most recent inbound notification and republishes it on the bus
//! as "notification processed", so routing code (deep links, badges, page
//! refreshes) can react without being wired to the backend.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::debug;

use crate::backend::Notification;
use crate::constants::events::NOTIFICATION_PROCESSED;
use crate::events::EventBus;

#[derive(Debug)]
pub struct NotificationProcessor {
    bus: Arc<EventBus>,
    last: RwLock<Option<Notification>>,
}

impl NotificationProcessor {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            bus,
            last: RwLock::new(None),
        }
    }

    /// Record `notification` as current and publish it
    pub fn process_notification(&self, notification: &Notification) {
        *self.last.write() = Some(notification.clone());
        let delivered = self
            .bus
            .emit(NOTIFICATION_PROCESSED, notification.raw().clone());
        debug!(observers = delivered, "Push notification processed");
    }

    pub fn last_notification(&self) -> Option<Notification> {
        self.last.read().clone()
    }
}

/// Extract `additionalData.payload` from a notification-shaped value
///
/// Never fails: anything without that path (including non-objects) yields `{}`.
pub fn get_payload(notification: &Value) -> Value {
    notification
        .get("additionalData")
        .and_then(|data| data.get("payload"))
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_get_payload_extracts_nested_field() {
        assert_eq!(
            get_payload(&json!({"additionalData": {"payload": {"a": 1}}})),
            json!({"a": 1})
        );
    }

    #[test]
    fn test_get_payload_defaults_to_empty_object() {
        assert_eq!(get_payload(&json!({})), json!({}));
        assert_eq!(get_payload(&json!("text")), json!({}));
        assert_eq!(get_payload(&json!(null)), json!({}));
        assert_eq!(get_payload(&json!({"additionalData": 5})), json!({}));
        assert_eq!(get_payload(&json!([{"additionalData": {}}])), json!({}));
    }

    #[test]
    fn test_process_records_and_publishes() {
        let bus = Arc::new(EventBus::new());
        let received = Arc::new(RwLock::new(Vec::new()));
        let sink = Arc::clone(&received);
        bus.on(NOTIFICATION_PROCESSED, move |event| {
            sink.write().push(event.payload.clone());
        });

        let processor = NotificationProcessor::new(Arc::clone(&bus));
        assert!(processor.last_notification().is_none());

        processor.process_notification(&Notification::new(json!({"message": "one"})));
        processor.process_notification(&Notification::new(json!({"message": "two"})));

        assert_eq!(
            processor.last_notification().unwrap().message(),
            Some("two")
        );
        assert_eq!(
            *received.read(),
            vec![json!({"message": "one"}), json!({"message": "two"})]
        );
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z]{0,8}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::hash_map(
                    prop_oneof![Just("additionalData".to_string()), Just("payload".to_string()), "[a-z]{1,6}"],
                    inner,
                    0..4
                )
                .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_get_payload_is_total(value in arb_json()) {
            let payload = get_payload(&value);
            match value.get("additionalData").and_then(|d| d.get("payload")) {
                Some(expected) => prop_assert_eq!(&payload, expected),
                None => prop_assert_eq!(payload, json!({})),
            }
        }
    }
}
