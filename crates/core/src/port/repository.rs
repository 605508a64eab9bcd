// Queue Repository Port - non-transactional reads and queue administration

use crate::domain::{EntryId, Queue, QueueEntry, QueueId};
use crate::error::Result;
use crate::port::ledger::WaitingEntry;
use async_trait::async_trait;

/// Aggregates over retained terminal rows (entries are never deleted).
#[derive(Debug, Clone, PartialEq)]
pub struct QueueStats {
    pub total_served: i64,
    /// Mean position at which entries were served within the window; the
    /// wait-time estimate derives from it.
    pub avg_served_position: f64,
    pub total_joined: i64,
    pub total_left: i64,
    pub waiting_count: i64,
}

/// Repository interface for queue and entry reads outside the ledger
/// transaction, plus queue creation.
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// Insert a new queue
    async fn insert_queue(&self, queue: &Queue) -> Result<()>;

    /// Find queue by ID
    async fn find_queue(&self, queue_id: &QueueId) -> Result<Option<Queue>>;

    /// Find entry by ID
    async fn find_entry(&self, entry_id: &EntryId) -> Result<Option<QueueEntry>>;

    /// Current WAITING snapshot, ascending by position (poll fallback for
    /// clients outside the proactive-notification window).
    async fn waiting_snapshot(&self, queue_id: &QueueId) -> Result<Vec<WaitingEntry>>;

    /// Owner analytics over the window starting at `since_millis`.
    async fn stats(&self, queue_id: &QueueId, since_millis: i64) -> Result<QueueStats>;
}
