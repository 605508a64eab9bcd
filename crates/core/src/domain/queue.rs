// Queue Domain Model

use serde::{Deserialize, Serialize};

/// Queue ID (UUID v4)
pub type QueueId = String;

/// A business-owned virtual queue.
///
/// `capacity` is a soft display limit, never enforced as a hard cap.
/// `category` and `location` are display-only. `custom_fields` declares the
/// extra contact-field keys entries of this queue may carry.
///
/// Invariant: the positions of this queue's WAITING entries are exactly the
/// dense sequence 1..count(WAITING). The position ledger is the single
/// enforcement point for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Queue {
    pub id: QueueId,
    pub owner_id: String,
    pub name: String,
    pub is_active: bool,
    pub capacity: Option<i64>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub custom_fields: Vec<String>,
    pub created_at: i64, // epoch ms
}

impl Queue {
    /// Create a new active queue.
    ///
    /// `id` and `created_at` are injected, not generated, so tests stay
    /// deterministic.
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        owner_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            name: name.into(),
            is_active: true,
            capacity: None,
            category: None,
            location: None,
            custom_fields: Vec::new(),
            created_at,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_queue_is_active() {
        let q = Queue::new("q-1", 1000, "owner-1", "Coffee Bar");
        assert!(q.is_active);
        assert!(q.custom_fields.is_empty());
    }

    #[test]
    fn test_ownership_check() {
        let q = Queue::new("q-1", 1000, "owner-1", "Coffee Bar");
        assert!(q.is_owned_by("owner-1"));
        assert!(!q.is_owned_by("someone-else"));
    }
}
