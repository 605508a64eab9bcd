// Serve / Skip Use Case (queue owner only)

use crate::application::dispatch::{DispatchOutcome, NotificationDispatcher};
use crate::application::fanout::ChangeNotifier;
use crate::application::ledger;
use crate::domain::{EntryId, QueueId, UserId};
use crate::error::{AppError, Result};
use crate::port::ledger::WaitingEntry;
use crate::port::{TimeProvider, TransactionalLedger};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryAction {
    Serve,
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEntryRequest {
    pub queue_id: QueueId,
    pub entry_id: EntryId,
    pub caller_id: UserId,
    pub action: EntryAction,
}

/// Result of a committed serve/skip/leave, with the post-commit side-effect
/// outcomes attached.
#[derive(Debug)]
pub struct MutationOutcome {
    pub snapshot: Vec<WaitingEntry>,
    pub sequence: u64,
    pub notifications: Vec<DispatchOutcome>,
}

pub async fn execute(
    ledger_port: &dyn TransactionalLedger,
    notifier: &ChangeNotifier,
    dispatcher: &NotificationDispatcher,
    time_provider: &dyn TimeProvider,
    req: UpdateEntryRequest,
) -> Result<MutationOutcome> {
    let now = time_provider.now_millis();

    // Phase 1: authorize and mutate inside one transaction.
    let mut tx = ledger_port.begin().await?;
    tx.lock_queue(&req.queue_id).await?;
    let queue = tx
        .find_queue(&req.queue_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("queue {}", req.queue_id)))?;
    if !queue.is_owned_by(&req.caller_id) {
        return Err(AppError::Forbidden(format!(
            "caller {} does not own queue {}",
            req.caller_id, queue.id
        )));
    }

    let outcome = match req.action {
        EntryAction::Serve => ledger::serve_entry(tx.as_mut(), &queue, &req.entry_id, now).await?,
        EntryAction::Skip => ledger::skip_entry(tx.as_mut(), &queue, &req.entry_id).await?,
    };
    tx.commit().await?;

    // Phase 2: fanout, then best-effort notifications over the fresh
    // snapshot.
    let sequence = notifier
        .publish_mutation(&req.queue_id, &outcome.snapshot, None)
        .await;

    let mut notifications = Vec::new();
    if req.action == EntryAction::Serve {
        // The served visitor is told directly that they are up.
        notifications.extend(dispatcher.send_your_turn(&queue, &outcome.entry.contact).await);
    }
    notifications.extend(dispatcher.notify_after_mutation(&queue, &outcome.snapshot).await);

    Ok(MutationOutcome {
        snapshot: outcome.snapshot,
        sequence,
        notifications,
    })
}
