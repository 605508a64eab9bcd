// Queue Broadcast Port - realtime fanout channel abstraction
//
// Publish is at-least-once and fire-and-forget: a failed publish is logged
// by the caller, never propagated into the request that triggered it.
// Subscribers treat snapshots as authoritative overwrites and use the
// sequence number to discard stale ones.

use crate::domain::{EntryId, Position, QueueId, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Queue-level summary published on every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSummary {
    pub waiting_count: i64,
    pub estimated_wait_minutes: i64,
}

/// Per-subscriber position delta. Derived fresh after each mutation, never
/// stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub entry_id: EntryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub position: Position,
    pub wait_minutes: i64,
}

/// Announcement of a new joiner carried on the join fanout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJoin {
    pub position: Position,
    pub name: String,
}

/// Events published to a per-queue topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum RealtimeEvent {
    QueueUpdated {
        summary: QueueSummary,
    },
    PositionUpdated {
        sequence: u64,
        updates: Vec<PositionUpdate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_join: Option<NewJoin>,
    },
    /// Dedicated urgent signal for subscribers at position 1 and within the
    /// top 3.
    PositionUrgent {
        sequence: u64,
        update: PositionUpdate,
    },
}

#[derive(Error, Debug)]
pub enum BroadcastError {
    #[error("broadcast transport unavailable: {0}")]
    Unavailable(String),
}

/// Realtime broadcast transport (implemented by the realtime hub).
#[async_trait]
pub trait QueueBroadcast: Send + Sync {
    async fn publish(
        &self,
        queue_id: &QueueId,
        event: RealtimeEvent,
    ) -> std::result::Result<(), BroadcastError>;
}

/// Blanket no-op sink for deployments without a realtime transport.
pub struct NoOpBroadcast;

#[async_trait]
impl QueueBroadcast for NoOpBroadcast {
    async fn publish(
        &self,
        _queue_id: &QueueId,
        _event: RealtimeEvent,
    ) -> std::result::Result<(), BroadcastError> {
        Ok(())
    }
}

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every published event for assertions.
    #[derive(Default, Clone)]
    pub struct RecordingBroadcast {
        events: Arc<Mutex<Vec<(QueueId, RealtimeEvent)>>>,
        fail: bool,
    }

    impl RecordingBroadcast {
        pub fn new() -> Self {
            Self::default()
        }

        /// A broadcast that always fails (fanout must swallow it).
        pub fn new_failing() -> Self {
            Self {
                events: Arc::default(),
                fail: true,
            }
        }

        pub fn events(&self) -> Vec<(QueueId, RealtimeEvent)> {
            self.events
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone()
        }

        /// Only the `position-updated` events for a queue, in publish order.
        pub fn position_updates(&self, queue_id: &str) -> Vec<(u64, Vec<PositionUpdate>)> {
            self.events()
                .into_iter()
                .filter(|(q, _)| q == queue_id)
                .filter_map(|(_, e)| match e {
                    RealtimeEvent::PositionUpdated {
                        sequence, updates, ..
                    } => Some((sequence, updates)),
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl QueueBroadcast for RecordingBroadcast {
        async fn publish(
            &self,
            queue_id: &QueueId,
            event: RealtimeEvent,
        ) -> std::result::Result<(), BroadcastError> {
            if self.fail {
                return Err(BroadcastError::Unavailable("test transport down".into()));
            }
            self.events
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push((queue_id.clone(), event));
            Ok(())
        }
    }
}
