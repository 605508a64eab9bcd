// Join Use Case

use crate::application::dispatch::{DispatchOutcome, NotificationDispatcher};
use crate::application::fanout::ChangeNotifier;
use crate::application::ledger;
use crate::domain::{ContactDetails, QueueId, UserId};
use crate::error::Result;
use crate::port::broadcast::NewJoin;
use crate::port::{IdProvider, TimeProvider, TransactionalLedger};
use serde::{Deserialize, Serialize};

/// Join request. `user_id` is the identity resolved by the external session
/// provider; anonymous joins carry only the contact payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub queue_id: QueueId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub contact: ContactDetails,
}

#[derive(Debug)]
pub struct JoinOutcome {
    pub entry_id: String,
    pub position: i64,
    pub estimated_wait_minutes: i64,
    pub sequence: u64,
    pub notifications: Vec<DispatchOutcome>,
}

/// Execute a join: ledger insert inside one transaction, then post-commit
/// fanout and best-effort notifications.
pub async fn execute(
    ledger_port: &dyn TransactionalLedger,
    notifier: &ChangeNotifier,
    dispatcher: &NotificationDispatcher,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
    req: JoinRequest,
) -> Result<JoinOutcome> {
    let entry_id = id_provider.generate_id();
    let joined_at = time_provider.now_millis();

    // Phase 1: atomic ledger mutation. A failure drops the transaction and
    // nothing observable happened.
    let mut tx = ledger_port.begin().await?;
    let (queue, outcome) = ledger::join_entry(
        tx.as_mut(),
        &req.queue_id,
        entry_id.clone(),
        req.user_id,
        req.contact,
        joined_at,
    )
    .await?;
    tx.commit().await?;

    // Phase 2: post-commit side effects, best-effort from here on.
    let new_join = NewJoin {
        position: outcome.entry.position,
        name: outcome.entry.contact.name.clone(),
    };
    let sequence = notifier
        .publish_mutation(&req.queue_id, &outcome.snapshot, Some(new_join))
        .await;

    let notifications = dispatcher
        .send_queue_joined(&queue, outcome.entry.position, &outcome.entry.contact)
        .await;

    Ok(JoinOutcome {
        entry_id,
        position: outcome.entry.position,
        estimated_wait_minutes: notifier.wait_minutes(outcome.entry.position),
        sequence,
        notifications,
    })
}
