// Lineup Infrastructure - Realtime Hub
// Implements: QueueBroadcast

mod hub;

pub use hub::{RealtimeHub, Subscription, DEFAULT_TOPIC_CAPACITY};
