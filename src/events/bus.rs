//! # Event Bus
//!
//! Named-event publish/subscribe used to announce coordinator lifecycle
//! events ("ready", "notification processed") to any number of observers.
//!
//! Delivery is synchronous: `emit` invokes every handler subscribed to the
//! event name, in subscription order, before it returns. One-shot handlers
//! registered with `once` are removed before they run, so a handler that
//! re-emits the same event cannot observe itself twice.
//!
//! Every emitted event is also mirrored onto a `tokio::sync::broadcast`
//! channel for async observers that prefer a receiver over a callback.
//!
//! ```rust
//! use pushkit_core::events::EventBus;
//! use serde_json::json;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let bus = EventBus::new();
//! let hits = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&hits);
//! bus.once("user.created", move |_event| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! bus.emit("user.created", json!({"user_id": 123}));
//! bus.emit("user.created", json!({"user_id": 456}));
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::constants::DEFAULT_BUS_CAPACITY;

/// Handler invoked for each delivered event
pub type EventHandler = Arc<dyn Fn(&BusEvent) + Send + Sync>;

/// Event that has been published on the bus
#[derive(Debug, Clone, Serialize)]
pub struct BusEvent {
    pub name: String,
    pub payload: Value,
    pub published_at: DateTime<Utc>,
}

/// Handle returned by `on`/`once`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    handler: EventHandler,
    once: bool,
}

/// Process-wide named-event bus
///
/// Shared by reference (`Arc<EventBus>`); coordinators never own it.
pub struct EventBus {
    subscribers: Mutex<HashMap<String, Vec<Subscription>>>,
    next_id: AtomicU64,
    mirror: broadcast::Sender<BusEvent>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscribers = self.subscribers.lock();
        let counts: HashMap<&str, usize> = subscribers
            .iter()
            .map(|(name, subs)| (name.as_str(), subs.len()))
            .collect();
        f.debug_struct("EventBus")
            .field("subscribers", &counts)
            .field("mirror_receivers", &self.mirror.receiver_count())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    /// Create a bus whose broadcast mirror buffers `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        let (mirror, _) = broadcast::channel(capacity.max(1));
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            mirror,
        }
    }

    /// Subscribe a persistent handler to `event_name`
    pub fn on<F>(&self, event_name: impl Into<String>, handler: F) -> SubscriptionId
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        self.add_subscription(event_name.into(), Arc::new(handler), false)
    }

    /// Subscribe a handler that is removed after its first delivery
    pub fn once<F>(&self, event_name: impl Into<String>, handler: F) -> SubscriptionId
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        self.add_subscription(event_name.into(), Arc::new(handler), true)
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        for subs in subscribers.values_mut() {
            if let Some(pos) = subs.iter().position(|s| s.id == id) {
                subs.remove(pos);
                return true;
            }
        }
        false
    }

    /// Publish an event. Returns the number of handlers invoked.
    pub fn emit(&self, event_name: impl Into<String>, payload: Value) -> usize {
        let event = BusEvent {
            name: event_name.into(),
            payload,
            published_at: Utc::now(),
        };

        // Snapshot under the lock, dispatch without it: handlers may subscribe or emit.
        let handlers: Vec<EventHandler> = {
            let mut subscribers = self.subscribers.lock();
            match subscribers.get_mut(&event.name) {
                Some(subs) => {
                    let handlers = subs.iter().map(|s| Arc::clone(&s.handler)).collect();
                    subs.retain(|s| !s.once);
                    handlers
                }
                None => Vec::new(),
            }
        };

        trace!(
            event_name = %event.name,
            handler_count = handlers.len(),
            "Dispatching bus event"
        );

        for handler in &handlers {
            handler(&event);
        }

        // No mirror receivers is fine; the event was still delivered to handlers.
        if self.mirror.send(event).is_err() {
            trace!("No broadcast receivers for bus event");
        }

        handlers.len()
    }

    /// Receive every subsequently emitted event asynchronously
    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.mirror.subscribe()
    }

    /// Number of live handlers for `event_name`
    pub fn subscriber_count(&self, event_name: &str) -> usize {
        self.subscribers
            .lock()
            .get(event_name)
            .map_or(0, |subs| subs.len())
    }

    fn add_subscription(&self, name: String, handler: EventHandler, once: bool) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(event_name = %name, subscription = id.0, once, "Bus subscription added");
        self.subscribers
            .lock()
            .entry(name)
            .or_default()
            .push(Subscription { id, handler, once });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> EventHandler) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_for_factory = Arc::clone(&log);
        let factory = move |tag: &str| -> EventHandler {
            let log = Arc::clone(&log_for_factory);
            let tag = tag.to_string();
            Arc::new(move |event: &BusEvent| log.lock().push(format!("{tag}:{}", event.payload)))
        };
        (log, factory)
    }

    #[test]
    fn test_delivery_in_subscription_order() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let first = make("first");
        let second = make("second");
        bus.on("evt", move |e| first(e));
        bus.on("evt", move |e| second(e));

        assert_eq!(bus.emit("evt", json!(1)), 2);
        assert_eq!(*log.lock(), vec!["first:1", "second:1"]);
    }

    #[test]
    fn test_once_fires_a_single_time() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let handler = make("once");
        bus.once("evt", move |e| handler(e));

        bus.emit("evt", json!("a"));
        bus.emit("evt", json!("b"));

        assert_eq!(*log.lock(), vec!["once:\"a\""]);
        assert_eq!(bus.subscriber_count("evt"), 0);
    }

    #[test]
    fn test_off_removes_subscription() {
        let bus = EventBus::new();
        let id = bus.on("evt", |_| panic!("unsubscribed handler must not run"));
        assert!(bus.off(id));
        assert!(!bus.off(id));
        assert_eq!(bus.emit("evt", Value::Null), 0);
    }

    #[test]
    fn test_events_are_isolated_by_name() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let handler = make("a");
        bus.on("a", move |e| handler(e));

        assert_eq!(bus.emit("b", json!(0)), 0);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_handler_may_subscribe_during_dispatch() {
        let bus = Arc::new(EventBus::new());
        let inner_bus = Arc::clone(&bus);
        bus.once("evt", move |_| {
            inner_bus.on("evt", |_| {});
        });

        // The handler added mid-dispatch is not part of the current delivery
        assert_eq!(bus.emit("evt", Value::Null), 1);
        assert_eq!(bus.subscriber_count("evt"), 1);
    }

    #[tokio::test]
    async fn test_broadcast_mirror_receives_events() {
        let bus = EventBus::with_capacity(8);
        let mut receiver = bus.subscribe();

        bus.emit("push.ready", json!({"debug": true}));

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.name, "push.ready");
        assert_eq!(event.payload, json!({"debug": true}));
    }
}
