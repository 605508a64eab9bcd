//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use lineup_core::application::queue_ops::EntryAction;
use lineup_core::application::DispatchOutcome;
use lineup_core::domain::ContactDetails;
use lineup_core::port::broadcast::PositionUpdate;
use serde::{Deserialize, Serialize};

/// queue.create.v1 - Create a queue
#[derive(Debug, Deserialize)]
pub struct CreateQueueParams {
    pub caller_id: String,
    pub name: String,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<String>,
    /// Owner contact for the confirmation message, if any.
    #[serde(default)]
    pub contact: Option<ContactDetails>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateQueueResult {
    pub queue_id: String,
    pub name: String,
}

/// queue.join.v1 - Join a queue
#[derive(Debug, Deserialize)]
pub struct JoinParams {
    pub queue_id: String,
    /// Identity resolved by the session provider; absent for anonymous
    /// joins.
    #[serde(default)]
    pub caller_id: Option<String>,
    pub contact: ContactDetails,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinResult {
    pub entry_id: String,
    pub position: i64,
    pub estimated_wait_minutes: i64,
    pub sequence: u64,
}

/// entry.update.v1 - Serve or skip an entry (queue owner only)
#[derive(Debug, Deserialize)]
pub struct UpdateEntryParams {
    pub queue_id: String,
    pub entry_id: String,
    pub caller_id: String,
    pub action: EntryAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateEntryResult {
    pub ok: bool,
    pub sequence: u64,
}

/// entry.remove.v1 - Remove an entry (owner or the entry's own user)
#[derive(Debug, Deserialize)]
pub struct RemoveEntryParams {
    pub queue_id: String,
    pub entry_id: String,
    pub caller_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveEntryResult {
    pub ok: bool,
    pub sequence: u64,
}

/// queue.snapshot.v1 - Poll fallback for clients past the proactive window
#[derive(Debug, Deserialize)]
pub struct SnapshotParams {
    pub queue_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotResult {
    pub sequence: u64,
    pub waiting_count: i64,
    pub estimated_wait_minutes: i64,
    pub updates: Vec<PositionUpdate>,
}

/// admin.stats.v1 - Owner analytics
#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub queue_id: String,
    pub caller_id: String,
    #[serde(default)]
    pub since_millis: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResult {
    pub total_served: i64,
    pub avg_wait_minutes: i64,
    pub abandonment_pct: f64,
    pub waiting_count: i64,
}

/// notify.welcome.v1 - Welcome messages for a new account
#[derive(Debug, Deserialize)]
pub struct WelcomeParams {
    pub contact: ContactDetails,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationResult {
    pub channel: String,
    pub success: bool,
    pub detail: String,
}

impl From<DispatchOutcome> for NotificationResult {
    fn from(outcome: DispatchOutcome) -> Self {
        Self {
            channel: outcome.channel.to_string(),
            success: outcome.success,
            detail: outcome.detail,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WelcomeResult {
    pub notifications: Vec<NotificationResult>,
}
