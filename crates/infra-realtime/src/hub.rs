// Realtime Hub - per-queue topics with reference-counted subscriber sets
//
// Replaces a global client registry: each queue gets its own topic, and the
// topic lives exactly as long as it has subscribers. Subscribe and
// unsubscribe are idempotent, keyed by (client_id, queue_id), so a client
// that re-subscribes after a reconnect neither leaks a slot nor double
// counts.

use async_trait::async_trait;
use lineup_core::domain::QueueId;
use lineup_core::port::broadcast::{BroadcastError, QueueBroadcast, RealtimeEvent};
use std::collections::{HashMap, HashSet};
use tokio::sync::broadcast;
use tokio::sync::RwLock;
use tracing::debug;

/// Events buffered per topic before slow receivers start lagging. Delivery
/// is at-least-once; a lagged receiver resynchronizes from the next
/// sequence-numbered snapshot.
pub const DEFAULT_TOPIC_CAPACITY: usize = 64;

struct Topic {
    sender: broadcast::Sender<RealtimeEvent>,
    subscribers: HashSet<String>,
}

/// A live subscription to one queue topic.
pub struct Subscription {
    pub client_id: String,
    pub queue_id: QueueId,
    pub receiver: broadcast::Receiver<RealtimeEvent>,
}

#[derive(Default)]
pub struct RealtimeHub {
    topics: RwLock<HashMap<QueueId, Topic>>,
    capacity: usize,
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Subscribe a client to a queue topic. Idempotent: re-subscribing the
    /// same client returns a fresh receiver without growing the subscriber
    /// set.
    pub async fn subscribe(&self, client_id: impl Into<String>, queue_id: &QueueId) -> Subscription {
        let client_id = client_id.into();
        let mut topics = self.topics.write().await;
        let capacity = if self.capacity == 0 {
            DEFAULT_TOPIC_CAPACITY
        } else {
            self.capacity
        };
        let topic = topics.entry(queue_id.clone()).or_insert_with(|| {
            debug!(queue_id = %queue_id, "opening realtime topic");
            Topic {
                sender: broadcast::channel(capacity).0,
                subscribers: HashSet::new(),
            }
        });
        topic.subscribers.insert(client_id.clone());
        Subscription {
            client_id,
            queue_id: queue_id.clone(),
            receiver: topic.sender.subscribe(),
        }
    }

    /// Unsubscribe a client; drops the topic once its subscriber set is
    /// empty. Idempotent for unknown clients and topics.
    pub async fn unsubscribe(&self, client_id: &str, queue_id: &QueueId) {
        let mut topics = self.topics.write().await;
        if let Some(topic) = topics.get_mut(queue_id) {
            topic.subscribers.remove(client_id);
            if topic.subscribers.is_empty() {
                debug!(queue_id = %queue_id, "closing realtime topic");
                topics.remove(queue_id);
            }
        }
    }

    pub async fn subscriber_count(&self, queue_id: &QueueId) -> usize {
        let topics = self.topics.read().await;
        topics
            .get(queue_id)
            .map(|t| t.subscribers.len())
            .unwrap_or(0)
    }

    pub async fn topic_count(&self) -> usize {
        self.topics.read().await.len()
    }
}

#[async_trait]
impl QueueBroadcast for RealtimeHub {
    async fn publish(
        &self,
        queue_id: &QueueId,
        event: RealtimeEvent,
    ) -> Result<(), BroadcastError> {
        let topics = self.topics.read().await;
        if let Some(topic) = topics.get(queue_id) {
            // send only errors when no receiver is alive, which is fine:
            // nobody was listening
            let _ = topic.sender.send(event);
        }
        Ok(())
    }
}
