// Queue Entry Domain Model

use crate::domain::contact::ContactDetails;
use crate::domain::error::{DomainError, Result};
use crate::domain::queue::QueueId;
use serde::{Deserialize, Serialize};

/// Entry ID (UUID v4)
pub type EntryId = String;

/// User identity supplied by the external session provider.
/// Entries may be anonymous, identified only by their contact payload.
pub type UserId = String;

/// 1-based rank of a WAITING entry within its queue.
pub type Position = i64;

/// Entry Status
///
/// WAITING is the only non-terminal state. SERVED and LEFT are terminal;
/// rows in terminal states are retained for analytics, never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Waiting,
    Served,
    Left,
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryStatus::Waiting => write!(f, "WAITING"),
            EntryStatus::Served => write!(f, "SERVED"),
            EntryStatus::Left => write!(f, "LEFT"),
        }
    }
}

impl std::str::FromStr for EntryStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "WAITING" => Ok(EntryStatus::Waiting),
            "SERVED" => Ok(EntryStatus::Served),
            "LEFT" => Ok(EntryStatus::Left),
            other => Err(DomainError::ValidationError(format!(
                "unknown entry status: {other}"
            ))),
        }
    }
}

/// Queue Entry Entity
///
/// `position` is meaningful only while status is WAITING.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: EntryId,
    pub queue_id: QueueId,
    pub user_id: Option<UserId>,
    pub position: Position,
    pub status: EntryStatus,
    pub joined_at: i64, // epoch ms
    pub served_at: Option<i64>,
    pub contact: ContactDetails,
}

impl QueueEntry {
    /// Create a new WAITING entry at the given position.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique entry ID (injected, not generated)
    /// * `queue_id` - Owning queue
    /// * `user_id` - Identified user, if any
    /// * `position` - Assigned by the position ledger
    /// * `joined_at` - Join timestamp in epoch ms (injected, not system time)
    /// * `contact` - Submitted contact payload
    pub fn new(
        id: impl Into<String>,
        queue_id: impl Into<String>,
        user_id: Option<UserId>,
        position: Position,
        joined_at: i64,
        contact: ContactDetails,
    ) -> Self {
        Self {
            id: id.into(),
            queue_id: queue_id.into(),
            user_id,
            position,
            status: EntryStatus::Waiting,
            joined_at,
            served_at: None,
            contact,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.status == EntryStatus::Waiting
    }

    /// Transition to SERVED with explicit timestamp.
    ///
    /// Fails from any terminal state; the caller surfaces the error, never
    /// retries it automatically.
    pub fn serve(&mut self, now_millis: i64) -> Result<()> {
        if self.status != EntryStatus::Waiting {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: "SERVED".to_string(),
            });
        }
        self.status = EntryStatus::Served;
        self.served_at = Some(now_millis);
        Ok(())
    }

    /// Transition to LEFT.
    pub fn leave(&mut self) -> Result<()> {
        if self.status != EntryStatus::Waiting {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: "LEFT".to_string(),
            });
        }
        self.status = EntryStatus::Left;
        Ok(())
    }

    /// Move a WAITING entry to a new position (skip is a WAITING self-loop,
    /// a position mutation rather than a state change).
    pub fn reposition(&mut self, position: Position) -> Result<()> {
        if self.status != EntryStatus::Waiting {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: "WAITING".to_string(),
            });
        }
        self.position = position;
        Ok(())
    }
}
