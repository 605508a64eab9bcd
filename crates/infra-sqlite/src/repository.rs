// SQLite Queue Repository (reads and queue administration outside the
// ledger transaction)

use crate::error::map_sqlx_error;
use crate::rows::{EntryRow, QueueRow};
use async_trait::async_trait;
use lineup_core::domain::{EntryId, EntryStatus, Queue, QueueEntry, QueueId};
use lineup_core::error::Result;
use lineup_core::port::ledger::WaitingEntry;
use lineup_core::port::repository::{QueueRepository, QueueStats};
use sqlx::SqlitePool;

pub struct SqliteQueueRepository {
    pool: SqlitePool,
}

impl SqliteQueueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueueRepository for SqliteQueueRepository {
    async fn insert_queue(&self, queue: &Queue) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO queues (
                id, owner_id, name, is_active, capacity,
                category, location, custom_fields, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&queue.id)
        .bind(&queue.owner_id)
        .bind(&queue.name)
        .bind(if queue.is_active { 1 } else { 0 })
        .bind(queue.capacity)
        .bind(&queue.category)
        .bind(&queue.location)
        .bind(serde_json::to_string(&queue.custom_fields)?)
        .bind(queue.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn find_queue(&self, queue_id: &QueueId) -> Result<Option<Queue>> {
        let row = sqlx::query_as::<_, QueueRow>("SELECT * FROM queues WHERE id = ?")
            .bind(queue_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.map(Queue::try_from).transpose()
    }

    async fn find_entry(&self, entry_id: &EntryId) -> Result<Option<QueueEntry>> {
        let row = sqlx::query_as::<_, EntryRow>("SELECT * FROM queue_entries WHERE id = ?")
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.map(QueueEntry::try_from).transpose()
    }

    async fn waiting_snapshot(&self, queue_id: &QueueId) -> Result<Vec<WaitingEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT * FROM queue_entries
            WHERE queue_id = ? AND status = ?
            ORDER BY position ASC
            "#,
        )
        .bind(queue_id)
        .bind(EntryStatus::Waiting.to_string())
        .fetch_all(&self.pool)
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

    async fn stats(&self, queue_id: &QueueId, since_millis: i64) -> Result<QueueStats> {
        let served = EntryStatus::Served.to_string();
        let left = EntryStatus::Left.to_string();
        let waiting = EntryStatus::Waiting.to_string();

        let total_served: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM queue_entries
            WHERE queue_id = ? AND status = ? AND COALESCE(served_at, 0) >= ?
            "#,
        )
        .bind(queue_id)
        .bind(&served)
        .bind(since_millis)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let avg_served_position: f64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(AVG(position), 0.0) FROM queue_entries
            WHERE queue_id = ? AND status = ? AND COALESCE(served_at, 0) >= ?
            "#,
        )
        .bind(queue_id)
        .bind(&served)
        .bind(since_millis)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let total_joined: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM queue_entries WHERE queue_id = ? AND joined_at >= ?",
        )
        .bind(queue_id)
        .bind(since_millis)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let total_left: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM queue_entries
            WHERE queue_id = ? AND status = ? AND joined_at >= ?
            "#,
        )
        .bind(queue_id)
        .bind(&left)
        .bind(since_millis)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let waiting_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM queue_entries WHERE queue_id = ? AND status = ?",
        )
        .bind(queue_id)
        .bind(&waiting)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(QueueStats {
            total_served,
            avg_served_position,
            total_joined,
            total_left,
            waiting_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use lineup_core::domain::ContactDetails;

    #[tokio::test]
    async fn test_queue_round_trip_with_custom_fields() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = SqliteQueueRepository::new(pool);

        let mut queue = Queue::new("q-1", 1000, "owner-1", "Front Desk");
        queue.custom_fields = vec!["party_size".to_string()];
        queue.location = Some("2nd floor".to_string());
        repo.insert_queue(&queue).await.unwrap();

        let loaded = repo.find_queue(&"q-1".to_string()).await.unwrap().unwrap();
        assert_eq!(loaded.custom_fields, vec!["party_size"]);
        assert_eq!(loaded.location.as_deref(), Some("2nd floor"));
        assert!(loaded.is_active);
    }

    #[tokio::test]
    async fn test_find_queue_missing_is_none() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = SqliteQueueRepository::new(pool);
        assert!(repo.find_queue(&"nope".to_string()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stats_over_terminal_rows() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = SqliteQueueRepository::new(pool.clone());
        repo.insert_queue(&Queue::new("q-1", 0, "owner-1", "Front Desk"))
            .await
            .unwrap();

        // two served (positions 1 and 3), one left, one still waiting
        let rows = [
            ("e-1", "SERVED", 1_i64, Some(5_000_i64)),
            ("e-2", "SERVED", 3, Some(6_000)),
            ("e-3", "LEFT", 2, None),
            ("e-4", "WAITING", 1, None),
        ];
        for (id, status, position, served_at) in rows {
            sqlx::query(
                r#"
                INSERT INTO queue_entries
                    (id, queue_id, user_id, position, status, joined_at, served_at, contact)
                VALUES (?, 'q-1', NULL, ?, ?, 1000, ?, ?)
                "#,
            )
            .bind(id)
            .bind(position)
            .bind(status)
            .bind(served_at)
            .bind(serde_json::to_string(&ContactDetails::new(id)).unwrap())
            .execute(&pool)
            .await
            .unwrap();
        }

        let stats = repo.stats(&"q-1".to_string(), 0).await.unwrap();
        assert_eq!(stats.total_served, 2);
        assert!((stats.avg_served_position - 2.0).abs() < f64::EPSILON);
        assert_eq!(stats.total_joined, 4);
        assert_eq!(stats.total_left, 1);
        assert_eq!(stats.waiting_count, 1);

        // A window after the first serve only counts the second one
        let stats = repo.stats(&"q-1".to_string(), 5_500).await.unwrap();
        assert_eq!(stats.total_served, 1);
        assert_eq!(stats.total_joined, 0);
    }
}
