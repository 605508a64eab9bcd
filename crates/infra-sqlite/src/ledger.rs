// SQLite Position Ledger Transaction
//
// One ledger operation = one transaction. `lock_queue` touches the queue
// row first, which upgrades the transaction to a writer immediately; two
// mutations of the same queue therefore serialize at the store, and the
// loser of a lock race surfaces as a retryable ConcurrencyConflict via the
// error mapping.

use crate::error::map_sqlx_error;
use crate::rows::{EntryRow, QueueRow};
use async_trait::async_trait;
use lineup_core::domain::{EntryId, EntryStatus, Position, Queue, QueueEntry, QueueId, UserId};
use lineup_core::error::Result;
use lineup_core::port::ledger::{
    LedgerTransaction, Transaction, TransactionalLedger, WaitingEntry,
};
use sqlx::{Sqlite, SqlitePool, Transaction as SqlxTransaction};

/// Factory handing out one SQLite transaction per ledger operation.
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionalLedger for SqliteLedger {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteLedgerTransaction { tx }))
    }
}

pub struct SqliteLedgerTransaction {
    tx: SqlxTransaction<'static, Sqlite>,
}

#[async_trait]
impl Transaction for SqliteLedgerTransaction {
    async fn commit(mut self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl LedgerTransaction for SqliteLedgerTransaction {
    async fn lock_queue(&mut self, queue_id: &QueueId) -> Result<()> {
        // No-op write on the queue row; forces the write lock before any
        // position is read. Idempotent within a transaction.
        sqlx::query("UPDATE queues SET is_active = is_active WHERE id = ?")
            .bind(queue_id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn find_queue(&mut self, queue_id: &QueueId) -> Result<Option<Queue>> {
        let row = sqlx::query_as::<_, QueueRow>("SELECT * FROM queues WHERE id = ?")
            .bind(queue_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        row.map(Queue::try_from).transpose()
    }

    async fn find_entry(&mut self, entry_id: &EntryId) -> Result<Option<QueueEntry>> {
        let row = sqlx::query_as::<_, EntryRow>("SELECT * FROM queue_entries WHERE id = ?")
            .bind(entry_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        row.map(QueueEntry::try_from).transpose()
    }

    async fn find_waiting_by_user(
        &mut self,
        queue_id: &QueueId,
        user_id: &UserId,
    ) -> Result<Option<QueueEntry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            "SELECT * FROM queue_entries WHERE queue_id = ? AND user_id = ? AND status = ? LIMIT 1",
        )
        .bind(queue_id)
        .bind(user_id)
        .bind(EntryStatus::Waiting.to_string())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        row.map(QueueEntry::try_from).transpose()
    }

    async fn max_waiting_position(&mut self, queue_id: &QueueId) -> Result<Position> {
        let max: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position), 0) FROM queue_entries WHERE queue_id = ? AND status = ?",
        )
        .bind(queue_id)
        .bind(EntryStatus::Waiting.to_string())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(max)
    }

    async fn waiting_count(&mut self, queue_id: &QueueId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM queue_entries WHERE queue_id = ? AND status = ?",
        )
        .bind(queue_id)
        .bind(EntryStatus::Waiting.to_string())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(count)
    }

    async fn insert_entry(&mut self, entry: &QueueEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO queue_entries (
                id, queue_id, user_id, position, status,
                joined_at, served_at, contact
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.queue_id)
        .bind(&entry.user_id)
        .bind(entry.position)
        .bind(entry.status.to_string())
        .bind(entry.joined_at)
        .bind(entry.served_at)
        .bind(serde_json::to_string(&entry.contact)?)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn update_entry(&mut self, entry: &QueueEntry) -> Result<()> {
        sqlx::query(
            "UPDATE queue_entries SET position = ?, status = ?, served_at = ? WHERE id = ?",
        )
        .bind(entry.position)
        .bind(entry.status.to_string())
        .bind(entry.served_at)
        .bind(&entry.id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn shift_positions_after(
        &mut self,
        queue_id: &QueueId,
        above: Position,
        exclude: Option<&EntryId>,
    ) -> Result<u64> {
        let result = match exclude {
            Some(excluded_id) => {
                sqlx::query(
                    r#"
                    UPDATE queue_entries
                    SET position = position - 1
                    WHERE queue_id = ? AND status = ? AND position > ? AND id != ?
                    "#,
                )
                .bind(queue_id)
                .bind(EntryStatus::Waiting.to_string())
                .bind(above)
                .bind(excluded_id)
                .execute(&mut *self.tx)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    UPDATE queue_entries
                    SET position = position - 1
                    WHERE queue_id = ? AND status = ? AND position > ?
                    "#,
                )
                .bind(queue_id)
                .bind(EntryStatus::Waiting.to_string())
                .bind(above)
                .execute(&mut *self.tx)
                .await
            }
        }
        .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    async fn waiting_snapshot(&mut self, queue_id: &QueueId) -> Result<Vec<WaitingEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT * FROM queue_entries
            WHERE queue_id = ? AND status = ?
            ORDER BY position ASC
            "#,
        )
        .bind(queue_id)
        .bind(EntryStatus::Waiting.to_string())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                let entry = QueueEntry::try_from(row)?;
                Ok(WaitingEntry {
                    entry_id: entry.id,
                    user_id: entry.user_id,
                    position: entry.position,
                    contact: entry.contact,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations, SqliteQueueRepository};
    use lineup_core::domain::ContactDetails;
    use lineup_core::port::QueueRepository;

    async fn setup() -> (SqlitePool, SqliteLedger) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let ledger = SqliteLedger::new(pool.clone());
        (pool, ledger)
    }

    #[tokio::test]
    async fn test_ledger_round_trip() {
        let (pool, ledger) = setup().await;
        let repo = SqliteQueueRepository::new(pool);
        repo.insert_queue(&Queue::new("q-1", 1000, "owner-1", "Front Desk"))
            .await
            .unwrap();

        let mut tx = ledger.begin().await.unwrap();
        tx.lock_queue(&"q-1".to_string()).await.unwrap();
        assert_eq!(tx.max_waiting_position(&"q-1".to_string()).await.unwrap(), 0);

        let entry = QueueEntry::new(
            "e-1",
            "q-1",
            Some("u-1".to_string()),
            1,
            2000,
            ContactDetails::new("Ada").with_email("ada@example.com"),
        );
        tx.insert_entry(&entry).await.unwrap();

        let found = tx
            .find_waiting_by_user(&"q-1".to_string(), &"u-1".to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "e-1");
        assert_eq!(found.contact.email.as_deref(), Some("ada@example.com"));

        tx.commit().await.unwrap();

        // Visible outside the transaction after commit
        let snapshot = repo.waiting_snapshot(&"q-1".to_string()).await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].position, 1);
    }

    #[tokio::test]
    async fn test_uncommitted_transaction_rolls_back_on_drop() {
        let (pool, ledger) = setup().await;
        let repo = SqliteQueueRepository::new(pool);
        repo.insert_queue(&Queue::new("q-1", 1000, "owner-1", "Front Desk"))
            .await
            .unwrap();

        {
            let mut tx = ledger.begin().await.unwrap();
            let entry = QueueEntry::new("e-1", "q-1", None, 1, 2000, ContactDetails::new("Ada"));
            tx.insert_entry(&entry).await.unwrap();
            // dropped without commit
        }

        let snapshot = repo.waiting_snapshot(&"q-1".to_string()).await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_shift_excludes_moved_entry() {
        let (pool, ledger) = setup().await;
        let repo = SqliteQueueRepository::new(pool);
        repo.insert_queue(&Queue::new("q-s", 1000, "owner-1", "Shift Desk"))
            .await
            .unwrap();

        let mut tx = ledger.begin().await.unwrap();
        tx.lock_queue(&"q-s".to_string()).await.unwrap();
        for (id, pos) in [("e-1", 1), ("e-2", 2), ("e-3", 3)] {
            let entry = QueueEntry::new(id, "q-s", None, pos, 1000, ContactDetails::new(id));
            tx.insert_entry(&entry).await.unwrap();
        }

        let shifted = tx
            .shift_positions_after(&"q-s".to_string(), 1, Some(&"e-1".to_string()))
            .await
            .unwrap();
        assert_eq!(shifted, 2);

        let snapshot = tx.waiting_snapshot(&"q-s".to_string()).await.unwrap();
        let mut positions: Vec<(String, i64)> = snapshot
            .into_iter()
            .map(|w| (w.entry_id, w.position))
            .collect();
        positions.sort();
        // e-1 was excluded from the decrement; e-2 and e-3 moved up
        assert_eq!(
            positions,
            vec![
                ("e-1".to_string(), 1),
                ("e-2".to_string(), 1),
                ("e-3".to_string(), 2)
            ]
        );
    }
}
