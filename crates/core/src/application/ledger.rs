// Position Ledger - single enforcement point for position arithmetic
//
// Owns the invariant that the positions of a queue's WAITING entries form
// the dense sequence 1..count(WAITING), with no gaps or duplicates, after
// every operation. All four mutations run inside one ledger transaction and
// return the complete updated WAITING ordering; the caller commits.

use crate::domain::{ContactDetails, EntryId, Queue, QueueEntry, QueueId, UserId};
use crate::error::{AppError, Result};
use crate::port::ledger::{LedgerTransaction, WaitingEntry};

/// Result of one ledger operation: the mutated entry plus the full WAITING
/// snapshot read under the same transaction.
#[derive(Debug)]
pub struct LedgerOutcome {
    pub entry: QueueEntry,
    pub snapshot: Vec<WaitingEntry>,
}

/// Insert a new WAITING entry at the tail of the queue.
///
/// New position = max(WAITING position) + 1, or 1 on an empty queue.
/// Vacated mid-sequence positions never need reuse because compaction runs
/// after every removal.
pub async fn join_entry(
    tx: &mut dyn LedgerTransaction,
    queue_id: &QueueId,
    entry_id: EntryId,
    user_id: Option<UserId>,
    contact: ContactDetails,
    joined_at: i64,
) -> Result<(Queue, LedgerOutcome)> {
    tx.lock_queue(queue_id).await?;

    let queue = tx
        .find_queue(queue_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("queue {queue_id}")))?;
    if !queue.is_active {
        return Err(AppError::QueueInactive(queue.id.clone()));
    }

    contact.validate(&queue.custom_fields)?;

    if let Some(uid) = &user_id {
        if tx.find_waiting_by_user(queue_id, uid).await?.is_some() {
            return Err(AppError::AlreadyQueued(format!(
                "user {uid} is already waiting in queue {queue_id}"
            )));
        }
    }

    let position = tx.max_waiting_position(queue_id).await? + 1;
    let entry = QueueEntry::new(entry_id, queue_id.clone(), user_id, position, joined_at, contact);
    tx.insert_entry(&entry).await?;

    let snapshot = tx.waiting_snapshot(queue_id).await?;
    Ok((queue, LedgerOutcome { entry, snapshot }))
}

/// Mark the entry SERVED and re-densify the sequence to 1..N-1 by
/// decrementing every WAITING position greater than the freed one.
///
/// Serving an entry that is not WAITING fails with `InvalidState` and
/// performs no decrement, so a retried serve cannot shift positions twice.
pub async fn serve_entry(
    tx: &mut dyn LedgerTransaction,
    queue: &Queue,
    entry_id: &EntryId,
    now_millis: i64,
) -> Result<LedgerOutcome> {
    tx.lock_queue(&queue.id).await?;

    let mut entry = fetch_queue_entry(tx, queue, entry_id).await?;
    entry
        .serve(now_millis)
        .map_err(|e| AppError::InvalidState(e.to_string()))?;

    let freed = entry.position;
    tx.update_entry(&entry).await?;
    tx.shift_positions_after(&queue.id, freed, None).await?;

    let snapshot = tx.waiting_snapshot(&queue.id).await?;
    Ok(LedgerOutcome { entry, snapshot })
}

/// Move a WAITING entry to the tail of the queue.
///
/// The new tail position equals the WAITING count taken from the same
/// pre-mutation snapshot used for the decrement; the moved entry is
/// excluded from the decrement so it cannot be shifted twice. Skipping the
/// entry already at the tail leaves every position unchanged.
pub async fn skip_entry(
    tx: &mut dyn LedgerTransaction,
    queue: &Queue,
    entry_id: &EntryId,
) -> Result<LedgerOutcome> {
    tx.lock_queue(&queue.id).await?;

    let mut entry = fetch_queue_entry(tx, queue, entry_id).await?;
    let vacated = entry.position;
    let tail = tx.waiting_count(&queue.id).await?;
    entry
        .reposition(tail)
        .map_err(|e| AppError::InvalidState(e.to_string()))?;

    tx.shift_positions_after(&queue.id, vacated, Some(&entry.id))
        .await?;
    tx.update_entry(&entry).await?;

    let snapshot = tx.waiting_snapshot(&queue.id).await?;
    Ok(LedgerOutcome { entry, snapshot })
}

/// Mark the entry LEFT and close the gap, identically to serve.
pub async fn leave_entry(
    tx: &mut dyn LedgerTransaction,
    queue: &Queue,
    entry_id: &EntryId,
) -> Result<LedgerOutcome> {
    tx.lock_queue(&queue.id).await?;

    let mut entry = fetch_queue_entry(tx, queue, entry_id).await?;
    entry
        .leave()
        .map_err(|e| AppError::InvalidState(e.to_string()))?;

    let freed = entry.position;
    tx.update_entry(&entry).await?;
    tx.shift_positions_after(&queue.id, freed, None).await?;

    let snapshot = tx.waiting_snapshot(&queue.id).await?;
    Ok(LedgerOutcome { entry, snapshot })
}

async fn fetch_queue_entry(
    tx: &mut dyn LedgerTransaction,
    queue: &Queue,
    entry_id: &EntryId,
) -> Result<QueueEntry> {
    let entry = tx
        .find_entry(entry_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("entry {entry_id}")))?;
    if entry.queue_id != queue.id {
        return Err(AppError::NotFound(format!(
            "entry {entry_id} in queue {}",
            queue.id
        )));
    }
    Ok(entry)
}
