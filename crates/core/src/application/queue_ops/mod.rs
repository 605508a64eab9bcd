// Queue Operations Service - request-level use cases
//
// Every mutation is two-phase by construction: the ledger transaction
// commits first, then fanout and notification dispatch run as best-effort
// side effects. A side-effect failure can therefore never roll back or fail
// a committed mutation.

pub mod create_queue;
pub mod join;
pub mod remove_entry;
pub mod stats;
pub mod update_entry;

pub use create_queue::{CreateQueueOutcome, CreateQueueRequest};
pub use join::{JoinOutcome, JoinRequest};
pub use remove_entry::RemoveEntryRequest;
pub use stats::{StatsReport, StatsRequest};
pub use update_entry::{EntryAction, MutationOutcome, UpdateEntryRequest};

use crate::application::dispatch::{DispatchOutcome, NotificationDispatcher};
use crate::application::fanout::ChangeNotifier;
use crate::domain::{ContactDetails, QueueId};
use crate::error::{AppError, Result};
use crate::port::broadcast::{PositionUpdate, QueueSummary};
use crate::port::{IdProvider, QueueRepository, TimeProvider, TransactionalLedger};
use serde::Serialize;
use std::sync::Arc;

/// Poll fallback for subscribers outside the proactive-notification window.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotView {
    pub sequence: u64,
    pub summary: QueueSummary,
    pub updates: Vec<PositionUpdate>,
}

/// Service facade wired by the composition root.
pub struct QueueOpsService {
    ledger: Arc<dyn TransactionalLedger>,
    repo: Arc<dyn QueueRepository>,
    notifier: Arc<ChangeNotifier>,
    dispatcher: Arc<NotificationDispatcher>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    estimate_minutes: i64,
}

impl QueueOpsService {
    pub fn new(
        ledger: Arc<dyn TransactionalLedger>,
        repo: Arc<dyn QueueRepository>,
        notifier: Arc<ChangeNotifier>,
        dispatcher: Arc<NotificationDispatcher>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        estimate_minutes: i64,
    ) -> Self {
        Self {
            ledger,
            repo,
            notifier,
            dispatcher,
            id_provider,
            time_provider,
            estimate_minutes,
        }
    }

    pub async fn create_queue(&self, req: CreateQueueRequest) -> Result<CreateQueueOutcome> {
        create_queue::execute(
            self.repo.as_ref(),
            self.dispatcher.as_ref(),
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
            req,
        )
        .await
    }

    pub async fn join(&self, req: JoinRequest) -> Result<JoinOutcome> {
        join::execute(
            self.ledger.as_ref(),
            self.notifier.as_ref(),
            self.dispatcher.as_ref(),
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
            req,
        )
        .await
    }

    pub async fn update_entry(&self, req: UpdateEntryRequest) -> Result<MutationOutcome> {
        update_entry::execute(
            self.ledger.as_ref(),
            self.notifier.as_ref(),
            self.dispatcher.as_ref(),
            self.time_provider.as_ref(),
            req,
        )
        .await
    }

    pub async fn remove_entry(&self, req: RemoveEntryRequest) -> Result<MutationOutcome> {
        remove_entry::execute(
            self.ledger.as_ref(),
            self.notifier.as_ref(),
            self.dispatcher.as_ref(),
            req,
        )
        .await
    }

    pub async fn stats(&self, req: StatsRequest) -> Result<StatsReport> {
        stats::execute(self.repo.as_ref(), self.estimate_minutes, req).await
    }

    /// Read-only snapshot; consumes no sequence number.
    pub async fn queue_snapshot(&self, queue_id: &QueueId) -> Result<SnapshotView> {
        self.repo
            .find_queue(queue_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("queue {queue_id}")))?;

        let snapshot = self.repo.waiting_snapshot(queue_id).await?;
        Ok(SnapshotView {
            sequence: self.notifier.current_sequence(queue_id),
            summary: self.notifier.summary(snapshot.len() as i64),
            updates: self.notifier.position_updates(&snapshot),
        })
    }

    pub async fn send_welcome(&self, contact: &ContactDetails) -> Vec<DispatchOutcome> {
        self.dispatcher.send_welcome(contact).await
    }
}
