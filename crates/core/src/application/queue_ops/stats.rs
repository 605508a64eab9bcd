// Queue Analytics Use Case (queue owner only)
//
// Aggregates over retained terminal rows; entries are never deleted, so the
// history is complete.

use crate::domain::{QueueId, UserId};
use crate::error::{AppError, Result};
use crate::port::QueueRepository;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsRequest {
    pub queue_id: QueueId,
    pub caller_id: UserId,
    /// Window start in epoch ms (0 = all time).
    #[serde(default)]
    pub since_millis: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub total_served: i64,
    pub avg_wait_minutes: i64,
    /// Share of entries in the window that left before being served.
    pub abandonment_pct: f64,
    pub waiting_count: i64,
}

pub async fn execute(
    repo: &dyn QueueRepository,
    estimate_minutes: i64,
    req: StatsRequest,
) -> Result<StatsReport> {
    let queue = repo
        .find_queue(&req.queue_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("queue {}", req.queue_id)))?;
    if !queue.is_owned_by(&req.caller_id) {
        return Err(AppError::Forbidden(format!(
            "caller {} does not own queue {}",
            req.caller_id, queue.id
        )));
    }

    let stats = repo.stats(&req.queue_id, req.since_millis).await?;

    let abandonment_pct = if stats.total_joined > 0 {
        (stats.total_left as f64 / stats.total_joined as f64) * 100.0
    } else {
        0.0
    };

    Ok(StatsReport {
        total_served: stats.total_served,
        avg_wait_minutes: (stats.avg_served_position * estimate_minutes as f64).round() as i64,
        abandonment_pct,
        waiting_count: stats.waiting_count,
    })
}
