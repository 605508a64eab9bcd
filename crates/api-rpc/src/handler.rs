//! RPC Method Handlers
//!
//! Translates method parameters into core use-case requests and maps the
//! results back to wire DTOs.

use crate::error::{throttled, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    CreateQueueParams, CreateQueueResult, JoinParams, JoinResult, RemoveEntryParams,
    RemoveEntryResult, SnapshotParams, SnapshotResult, StatsParams, StatsResult,
    UpdateEntryParams, UpdateEntryResult, WelcomeParams, WelcomeResult,
};
use jsonrpsee::types::ErrorObjectOwned;
use lineup_core::application::queue_ops::{
    CreateQueueRequest, JoinRequest, RemoveEntryRequest, StatsRequest, UpdateEntryRequest,
};
use lineup_core::application::QueueOpsService;
use std::sync::Arc;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    service: Arc<QueueOpsService>,
    rate_limiter: Arc<RateLimiter>,
}

impl RpcHandler {
    pub fn new(service: Arc<QueueOpsService>) -> Self {
        // Default: 200 burst, 100 req/sec (configurable via env)
        let max_burst: u32 = std::env::var("LINEUP_RATE_LIMIT_BURST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(200);

        let rate_per_sec: u32 = std::env::var("LINEUP_RATE_LIMIT_RATE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        Self {
            service,
            rate_limiter: Arc::new(RateLimiter::new(max_burst, rate_per_sec)),
        }
    }

    fn admit(&self) -> Result<(), ErrorObjectOwned> {
        if self.rate_limiter.check() {
            Ok(())
        } else {
            Err(throttled())
        }
    }

    /// queue.create.v1
    pub async fn create_queue(
        &self,
        params: CreateQueueParams,
    ) -> Result<CreateQueueResult, ErrorObjectOwned> {
        self.admit()?;

        let outcome = self
            .service
            .create_queue(CreateQueueRequest {
                owner_id: params.caller_id,
                name: params.name,
                capacity: params.capacity,
                category: params.category,
                location: params.location,
                custom_fields: params.custom_fields,
                owner_contact: params.contact,
            })
            .await
            .map_err(to_rpc_error)?;

        Ok(CreateQueueResult {
            queue_id: outcome.queue.id,
            name: outcome.queue.name,
        })
    }

    /// queue.join.v1
    pub async fn join(&self, params: JoinParams) -> Result<JoinResult, ErrorObjectOwned> {
        self.admit()?;

        let outcome = self
            .service
            .join(JoinRequest {
                queue_id: params.queue_id,
                user_id: params.caller_id,
                contact: params.contact,
            })
            .await
            .map_err(to_rpc_error)?;

        Ok(JoinResult {
            entry_id: outcome.entry_id,
            position: outcome.position,
            estimated_wait_minutes: outcome.estimated_wait_minutes,
            sequence: outcome.sequence,
        })
    }

    /// entry.update.v1
    pub async fn update_entry(
        &self,
        params: UpdateEntryParams,
    ) -> Result<UpdateEntryResult, ErrorObjectOwned> {
        self.admit()?;

        let outcome = self
            .service
            .update_entry(UpdateEntryRequest {
                queue_id: params.queue_id,
                entry_id: params.entry_id,
                caller_id: params.caller_id,
                action: params.action,
            })
            .await
            .map_err(to_rpc_error)?;

        Ok(UpdateEntryResult {
            ok: true,
            sequence: outcome.sequence,
        })
    }

    /// entry.remove.v1
    pub async fn remove_entry(
        &self,
        params: RemoveEntryParams,
    ) -> Result<RemoveEntryResult, ErrorObjectOwned> {
        self.admit()?;

        let outcome = self
            .service
            .remove_entry(RemoveEntryRequest {
                queue_id: params.queue_id,
                entry_id: params.entry_id,
                caller_id: params.caller_id,
            })
            .await
            .map_err(to_rpc_error)?;

        Ok(RemoveEntryResult {
            ok: true,
            sequence: outcome.sequence,
        })
    }

    /// queue.snapshot.v1
    pub async fn snapshot(&self, params: SnapshotParams) -> Result<SnapshotResult, ErrorObjectOwned> {
        self.admit()?;

        let view = self
            .service
            .queue_snapshot(&params.queue_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(SnapshotResult {
            sequence: view.sequence,
            waiting_count: view.summary.waiting_count,
            estimated_wait_minutes: view.summary.estimated_wait_minutes,
            updates: view.updates,
        })
    }

    /// admin.stats.v1
    pub async fn stats(&self, params: StatsParams) -> Result<StatsResult, ErrorObjectOwned> {
        self.admit()?;

        let report = self
            .service
            .stats(StatsRequest {
                queue_id: params.queue_id,
                caller_id: params.caller_id,
                since_millis: params.since_millis,
            })
            .await
            .map_err(to_rpc_error)?;

        Ok(StatsResult {
            total_served: report.total_served,
            avg_wait_minutes: report.avg_wait_minutes,
            abandonment_pct: report.abandonment_pct,
            waiting_count: report.waiting_count,
        })
    }

    /// notify.welcome.v1
    pub async fn welcome(&self, params: WelcomeParams) -> Result<WelcomeResult, ErrorObjectOwned> {
        self.admit()?;

        let outcomes = self.service.send_welcome(&params.contact).await;
        Ok(WelcomeResult {
            notifications: outcomes.into_iter().map(Into::into).collect(),
        })
    }
}
