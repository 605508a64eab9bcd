// Position Ledger Port - transactional access to the WAITING sequence
//
// The WAITING position sequence of a single queue is the critical shared
// resource. Every ledger operation runs inside one transaction against the
// durable store; `lock_queue` is the serialization point that makes two
// concurrent mutations of the same queue observably ordered.

use crate::domain::{ContactDetails, EntryId, Position, Queue, QueueEntry, QueueId, UserId};
use crate::error::Result;
use async_trait::async_trait;

/// One row of the WAITING snapshot, ascending by position.
#[derive(Debug, Clone)]
pub struct WaitingEntry {
    pub entry_id: EntryId,
    pub user_id: Option<UserId>,
    pub position: Position,
    pub contact: ContactDetails,
}

/// Transaction trait for atomic multi-step operations
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Entry point for ledger transactions
#[async_trait]
pub trait TransactionalLedger: Send + Sync {
    /// Begin a new ledger transaction
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>>;
}

/// Ledger operations within a transaction.
///
/// Implementations map contention aborts (e.g. a busy/locked store) to
/// `AppError::ConcurrencyConflict` so callers can retry with backoff.
#[async_trait]
pub trait LedgerTransaction: Transaction {
    /// Acquire the write serialization point for a queue. Must be the first
    /// call of any mutating operation so that the subsequent reads observe
    /// a stable snapshot.
    async fn lock_queue(&mut self, queue_id: &QueueId) -> Result<()>;

    async fn find_queue(&mut self, queue_id: &QueueId) -> Result<Option<Queue>>;

    async fn find_entry(&mut self, entry_id: &EntryId) -> Result<Option<QueueEntry>>;

    /// Find a WAITING entry of an identified user in a queue (duplicate-join
    /// precondition).
    async fn find_waiting_by_user(
        &mut self,
        queue_id: &QueueId,
        user_id: &UserId,
    ) -> Result<Option<QueueEntry>>;

    /// Max WAITING position in the queue (0 if the queue is empty).
    async fn max_waiting_position(&mut self, queue_id: &QueueId) -> Result<Position>;

    /// Count of WAITING entries in the queue.
    async fn waiting_count(&mut self, queue_id: &QueueId) -> Result<i64>;

    async fn insert_entry(&mut self, entry: &QueueEntry) -> Result<()>;

    /// Persist an entry's status / position / served_at mutation.
    async fn update_entry(&mut self, entry: &QueueEntry) -> Result<()>;

    /// Decrement by one the position of every WAITING entry of the queue
    /// with position > `above`, excluding `exclude` if given. Returns the
    /// number of shifted rows.
    async fn shift_positions_after(
        &mut self,
        queue_id: &QueueId,
        above: Position,
        exclude: Option<&EntryId>,
    ) -> Result<u64>;

    /// Full WAITING snapshot of the queue, ascending by position.
    async fn waiting_snapshot(&mut self, queue_id: &QueueId) -> Result<Vec<WaitingEntry>>;
}

pub mod mocks {
    //! In-memory ledger for core unit tests.
    //!
    //! Transactions clone the shared state, mutate the clone, and write it
    //! back on commit. Good enough for the sequential unit tests in this
    //! crate; cross-transaction serialization is exercised against the real
    //! store in the integration-tests crate.

    use super::*;
    use crate::domain::EntryStatus;
    use crate::error::AppError;
    use crate::port::repository::{QueueRepository, QueueStats};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct MemoryState {
        queues: HashMap<QueueId, Queue>,
        entries: HashMap<EntryId, QueueEntry>,
    }

    impl MemoryState {
        fn waiting(&self, queue_id: &str) -> Vec<&QueueEntry> {
            let mut rows: Vec<&QueueEntry> = self
                .entries
                .values()
                .filter(|e| e.queue_id == queue_id && e.is_waiting())
                .collect();
            rows.sort_by_key(|e| e.position);
            rows
        }
    }

    /// In-memory store implementing both the transactional ledger and the
    /// read-side repository.
    #[derive(Default, Clone)]
    pub struct MemoryLedger {
        state: Arc<Mutex<MemoryState>>,
    }

    impl MemoryLedger {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_queue(&self, queue: Queue) {
            self.lock().queues.insert(queue.id.clone(), queue);
        }

        pub fn entry(&self, entry_id: &str) -> Option<QueueEntry> {
            self.lock().entries.get(entry_id).cloned()
        }

        pub fn waiting_positions(&self, queue_id: &str) -> Vec<(EntryId, Position)> {
            self.lock()
                .waiting(queue_id)
                .into_iter()
                .map(|e| (e.id.clone(), e.position))
                .collect()
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
            self.state.lock().unwrap_or_else(|e| e.into_inner())
        }
    }

    #[async_trait]
    impl TransactionalLedger for MemoryLedger {
        async fn begin(&self) -> Result<Box<dyn LedgerTransaction>> {
            let working = self.lock().clone();
            Ok(Box::new(MemoryLedgerTransaction {
                shared: Arc::clone(&self.state),
                working,
            }))
        }
    }

    pub struct MemoryLedgerTransaction {
        shared: Arc<Mutex<MemoryState>>,
        working: MemoryState,
    }

    #[async_trait]
    impl Transaction for MemoryLedgerTransaction {
        async fn commit(self: Box<Self>) -> Result<()> {
            let MemoryLedgerTransaction { shared, working } = *self;
            let mut state = shared.lock().unwrap_or_else(|e| e.into_inner());
            *state = working;
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl LedgerTransaction for MemoryLedgerTransaction {
        async fn lock_queue(&mut self, _queue_id: &QueueId) -> Result<()> {
            Ok(())
        }

        async fn find_queue(&mut self, queue_id: &QueueId) -> Result<Option<Queue>> {
            Ok(self.working.queues.get(queue_id).cloned())
        }

        async fn find_entry(&mut self, entry_id: &EntryId) -> Result<Option<QueueEntry>> {
            Ok(self.working.entries.get(entry_id).cloned())
        }

        async fn find_waiting_by_user(
            &mut self,
            queue_id: &QueueId,
            user_id: &UserId,
        ) -> Result<Option<QueueEntry>> {
            Ok(self
                .working
                .entries
                .values()
                .find(|e| {
                    e.queue_id == *queue_id
                        && e.is_waiting()
                        && e.user_id.as_deref() == Some(user_id.as_str())
                })
                .cloned())
        }

        async fn max_waiting_position(&mut self, queue_id: &QueueId) -> Result<Position> {
            Ok(self
                .working
                .waiting(queue_id)
                .last()
                .map(|e| e.position)
                .unwrap_or(0))
        }

        async fn waiting_count(&mut self, queue_id: &QueueId) -> Result<i64> {
            Ok(self.working.waiting(queue_id).len() as i64)
        }

        async fn insert_entry(&mut self, entry: &QueueEntry) -> Result<()> {
            self.working
                .entries
                .insert(entry.id.clone(), entry.clone());
            Ok(())
        }

        async fn update_entry(&mut self, entry: &QueueEntry) -> Result<()> {
            match self.working.entries.get_mut(&entry.id) {
                Some(stored) => {
                    *stored = entry.clone();
                    Ok(())
                }
                None => Err(AppError::NotFound(format!("entry {}", entry.id))),
            }
        }

        async fn shift_positions_after(
            &mut self,
            queue_id: &QueueId,
            above: Position,
            exclude: Option<&EntryId>,
        ) -> Result<u64> {
            let mut shifted = 0;
            for e in self.working.entries.values_mut() {
                if e.queue_id == *queue_id
                    && e.is_waiting()
                    && e.position > above
                    && exclude != Some(&e.id)
                {
                    e.position -= 1;
                    shifted += 1;
                }
            }
            Ok(shifted)
        }

        async fn waiting_snapshot(&mut self, queue_id: &QueueId) -> Result<Vec<WaitingEntry>> {
            Ok(self
                .working
                .waiting(queue_id)
                .into_iter()
                .map(|e| WaitingEntry {
                    entry_id: e.id.clone(),
                    user_id: e.user_id.clone(),
                    position: e.position,
                    contact: e.contact.clone(),
                })
                .collect())
        }
    }

    #[async_trait]
    impl QueueRepository for MemoryLedger {
        async fn insert_queue(&self, queue: &Queue) -> Result<()> {
            self.lock().queues.insert(queue.id.clone(), queue.clone());
            Ok(())
        }

        async fn find_queue(&self, queue_id: &QueueId) -> Result<Option<Queue>> {
            Ok(self.lock().queues.get(queue_id).cloned())
        }

        async fn find_entry(&self, entry_id: &EntryId) -> Result<Option<QueueEntry>> {
            Ok(self.lock().entries.get(entry_id).cloned())
        }

        async fn waiting_snapshot(&self, queue_id: &QueueId) -> Result<Vec<WaitingEntry>> {
            Ok(self
                .lock()
                .waiting(queue_id)
                .into_iter()
                .map(|e| WaitingEntry {
                    entry_id: e.id.clone(),
                    user_id: e.user_id.clone(),
                    position: e.position,
                    contact: e.contact.clone(),
                })
                .collect())
        }

        async fn stats(&self, queue_id: &QueueId, since_millis: i64) -> Result<QueueStats> {
            let state = self.lock();
            let in_queue: Vec<&QueueEntry> = state
                .entries
                .values()
                .filter(|e| e.queue_id == *queue_id)
                .collect();

            let served: Vec<&&QueueEntry> = in_queue
                .iter()
                .filter(|e| {
                    e.status == EntryStatus::Served && e.served_at.unwrap_or(0) >= since_millis
                })
                .collect();
            let joined_in_window: Vec<&&QueueEntry> = in_queue
                .iter()
                .filter(|e| e.joined_at >= since_millis)
                .collect();

            let avg_served_position = if served.is_empty() {
                0.0
            } else {
                served.iter().map(|e| e.position as f64).sum::<f64>() / served.len() as f64
            };

            Ok(QueueStats {
                total_served: served.len() as i64,
                avg_served_position,
                total_joined: joined_in_window.len() as i64,
                total_left: joined_in_window
                    .iter()
                    .filter(|e| e.status == EntryStatus::Left)
                    .count() as i64,
                waiting_count: state.waiting(queue_id).len() as i64,
            })
        }
    }
}
