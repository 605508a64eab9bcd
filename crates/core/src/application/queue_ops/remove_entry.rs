// Leave / Remove Use Case (queue owner or the entry's own user)

use crate::application::dispatch::NotificationDispatcher;
use crate::application::fanout::ChangeNotifier;
use crate::application::ledger;
use crate::application::queue_ops::update_entry::MutationOutcome;
use crate::domain::{EntryId, QueueId, UserId};
use crate::error::{AppError, Result};
use crate::port::TransactionalLedger;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveEntryRequest {
    pub queue_id: QueueId,
    pub entry_id: EntryId,
    pub caller_id: UserId,
}

pub async fn execute(
    ledger_port: &dyn TransactionalLedger,
    notifier: &ChangeNotifier,
    dispatcher: &NotificationDispatcher,
    req: RemoveEntryRequest,
) -> Result<MutationOutcome> {
    // Phase 1: authorize and mutate inside one transaction.
    let mut tx = ledger_port.begin().await?;
    tx.lock_queue(&req.queue_id).await?;
    let queue = tx
        .find_queue(&req.queue_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("queue {}", req.queue_id)))?;
    let entry = tx
        .find_entry(&req.entry_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("entry {}", req.entry_id)))?;

    let allowed = queue.is_owned_by(&req.caller_id)
        || entry.user_id.as_deref() == Some(req.caller_id.as_str());
    if !allowed {
        return Err(AppError::Forbidden(format!(
            "caller {} may not remove entry {}",
            req.caller_id, req.entry_id
        )));
    }

    let outcome = ledger::leave_entry(tx.as_mut(), &queue, &req.entry_id).await?;
    tx.commit().await?;

    // Phase 2: everyone who moved up gets the routed updates.
    let sequence = notifier
        .publish_mutation(&req.queue_id, &outcome.snapshot, None)
        .await;
    let notifications = dispatcher.notify_after_mutation(&queue, &outcome.snapshot).await;

    Ok(MutationOutcome {
        snapshot: outcome.snapshot,
        sequence,
        notifications,
    })
}
