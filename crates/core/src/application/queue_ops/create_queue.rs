// Create Queue Use Case

use crate::application::dispatch::{DispatchOutcome, NotificationDispatcher};
use crate::domain::{ContactDetails, Queue, UserId};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, QueueRepository, TimeProvider};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQueueRequest {
    pub owner_id: UserId,
    pub name: String,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<String>,
    /// Owner contact for the queue-created confirmation, if any.
    #[serde(default)]
    pub owner_contact: Option<ContactDetails>,
}

#[derive(Debug)]
pub struct CreateQueueOutcome {
    pub queue: Queue,
    pub notifications: Vec<DispatchOutcome>,
}

pub async fn execute(
    repo: &dyn QueueRepository,
    dispatcher: &NotificationDispatcher,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
    req: CreateQueueRequest,
) -> Result<CreateQueueOutcome> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("queue name must not be empty".into()));
    }

    let mut queue = Queue::new(
        id_provider.generate_id(),
        time_provider.now_millis(),
        req.owner_id,
        req.name,
    );
    queue.capacity = req.capacity;
    queue.category = req.category;
    queue.location = req.location;
    queue.custom_fields = req.custom_fields;

    repo.insert_queue(&queue).await?;

    let notifications = match &req.owner_contact {
        Some(contact) => dispatcher.send_queue_created(&queue, contact).await,
        None => Vec::new(),
    };

    Ok(CreateQueueOutcome {
        queue,
        notifications,
    })
}
