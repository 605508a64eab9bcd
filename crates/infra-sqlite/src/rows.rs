// Row types shared by the repository and the ledger transaction

use lineup_core::domain::{ContactDetails, EntryStatus, Queue, QueueEntry};
use lineup_core::error::AppError;

#[derive(sqlx::FromRow)]
pub(crate) struct QueueRow {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub is_active: i64,
    pub capacity: Option<i64>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub custom_fields: String,
    pub created_at: i64,
}

impl TryFrom<QueueRow> for Queue {
    type Error = AppError;

    fn try_from(row: QueueRow) -> Result<Self, Self::Error> {
        let custom_fields: Vec<String> = serde_json::from_str(&row.custom_fields)?;
        Ok(Queue {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            is_active: row.is_active != 0,
            capacity: row.capacity,
            category: row.category,
            location: row.location,
            custom_fields,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct EntryRow {
    pub id: String,
    pub queue_id: String,
    pub user_id: Option<String>,
    pub position: i64,
    pub status: String,
    pub joined_at: i64,
    pub served_at: Option<i64>,
    pub contact: String,
}

impl TryFrom<EntryRow> for QueueEntry {
    type Error = AppError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let status: EntryStatus = row.status.parse().map_err(AppError::Domain)?;
        let contact: ContactDetails = serde_json::from_str(&row.contact)?;
        Ok(QueueEntry {
            id: row.id,
            queue_id: row.queue_id,
            user_id: row.user_id,
            position: row.position,
            status,
            joined_at: row.joined_at,
            served_at: row.served_at,
            contact,
        })
    }
}
