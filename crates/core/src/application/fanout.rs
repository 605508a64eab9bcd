// Change Notifier - computes and publishes position deltas after a commit
//
// Runs strictly after the ledger transaction has committed. Publish is
// best-effort: a failed publish is logged and the lifecycle request still
// succeeds, because the durable state is already authoritative.

use crate::domain::{EntryId, Position, QueueId};
use crate::port::broadcast::{
    NewJoin, PositionUpdate, QueueBroadcast, QueueSummary, RealtimeEvent,
};
use crate::port::ledger::WaitingEntry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Default per-person service estimate used for wait-time display.
pub const DEFAULT_SERVICE_ESTIMATE_MINUTES: i64 = 2;

/// Positions at or below this threshold get the dedicated urgent signal.
const URGENT_POSITION_THRESHOLD: Position = 3;

/// Computes the minimal update set from a fresh WAITING snapshot and pushes
/// it through the realtime channel, stamped with a monotonically increasing
/// per-queue sequence number so subscribers can discard stale snapshots.
pub struct ChangeNotifier {
    broadcast: Arc<dyn QueueBroadcast>,
    estimate_minutes: i64,
    sequences: Mutex<HashMap<QueueId, u64>>,
}

impl ChangeNotifier {
    pub fn new(broadcast: Arc<dyn QueueBroadcast>, estimate_minutes: i64) -> Self {
        Self {
            broadcast,
            estimate_minutes,
            sequences: Mutex::new(HashMap::new()),
        }
    }

    /// Wait estimate for a position. A display estimate, not a scheduling
    /// guarantee; recomputed on every fanout, never cached.
    pub fn wait_minutes(&self, position: Position) -> i64 {
        position * self.estimate_minutes
    }

    pub fn summary(&self, waiting_count: i64) -> QueueSummary {
        QueueSummary {
            waiting_count,
            estimated_wait_minutes: waiting_count * self.estimate_minutes,
        }
    }

    /// Last sequence issued for a queue (0 before the first fanout). Poll
    /// responses carry this so clients can order them against pushed
    /// snapshots.
    pub fn current_sequence(&self, queue_id: &str) -> u64 {
        let sequences = self.sequences.lock().unwrap_or_else(|e| e.into_inner());
        sequences.get(queue_id).copied().unwrap_or(0)
    }

    fn next_sequence(&self, queue_id: &str) -> u64 {
        let mut sequences = self.sequences.lock().unwrap_or_else(|e| e.into_inner());
        let seq = sequences.entry(queue_id.to_string()).or_insert(0);
        *seq += 1;
        *seq
    }

    pub fn position_updates(&self, snapshot: &[WaitingEntry]) -> Vec<PositionUpdate> {
        snapshot
            .iter()
            .map(|w| PositionUpdate {
                entry_id: w.entry_id.clone(),
                user_id: w.user_id.clone(),
                position: w.position,
                wait_minutes: self.wait_minutes(w.position),
            })
            .collect()
    }

    /// Publish the queue summary plus the full position snapshot after a
    /// committed mutation. Subscribers at position 1 and within the top 3
    /// additionally receive the dedicated urgent signal. Returns the
    /// sequence stamped onto this snapshot.
    pub async fn publish_mutation(
        &self,
        queue_id: &QueueId,
        snapshot: &[WaitingEntry],
        new_join: Option<NewJoin>,
    ) -> u64 {
        let updates = self.position_updates(snapshot);
        let sequence = self.next_sequence(queue_id);

        self.publish(
            queue_id,
            RealtimeEvent::QueueUpdated {
                summary: self.summary(snapshot.len() as i64),
            },
        )
        .await;

        self.publish(
            queue_id,
            RealtimeEvent::PositionUpdated {
                sequence,
                updates: updates.clone(),
                new_join,
            },
        )
        .await;

        for update in updates
            .into_iter()
            .filter(|u| u.position <= URGENT_POSITION_THRESHOLD)
        {
            self.publish(queue_id, RealtimeEvent::PositionUrgent { sequence, update })
                .await;
        }

        sequence
    }

    async fn publish(&self, queue_id: &QueueId, event: RealtimeEvent) {
        if let Err(e) = self.broadcast.publish(queue_id, event).await {
            warn!(queue_id = %queue_id, error = %e, "realtime publish failed, state already committed");
        }
    }
}

/// Client-side reconciliation of pushed snapshots.
///
/// An incoming snapshot is authoritative: it overwrites the displayed
/// positions wholesale, never merges. Snapshots whose sequence is not
/// greater than the last applied one are discarded, which makes redelivery
/// and out-of-order delivery harmless.
#[derive(Debug, Default)]
pub struct SnapshotReconciler {
    last_sequence: Option<u64>,
    positions: HashMap<EntryId, PositionUpdate>,
}

impl SnapshotReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a snapshot; returns false if it was stale and discarded.
    pub fn apply(&mut self, sequence: u64, updates: &[PositionUpdate]) -> bool {
        if let Some(last) = self.last_sequence {
            if sequence <= last {
                return false;
            }
        }
        self.last_sequence = Some(sequence);
        self.positions = updates
            .iter()
            .map(|u| (u.entry_id.clone(), u.clone()))
            .collect();
        true
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    pub fn position_of(&self, entry_id: &str) -> Option<Position> {
        self.positions.get(entry_id).map(|u| u.position)
    }

    pub fn wait_minutes_of(&self, entry_id: &str) -> Option<i64> {
        self.positions.get(entry_id).map(|u| u.wait_minutes)
    }
}
