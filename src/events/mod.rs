pub mod bus;

// Re-export key types for convenience
pub use crate::constants::events as names;
pub use bus::{BusEvent, EventBus, EventHandler, SubscriptionId};
