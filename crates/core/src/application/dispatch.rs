// Notification Dispatch Adapter - best-effort outbound messages
//
// Translates lifecycle events into zero or more messages across independent
// channels. Runs only after the ledger transaction has committed and the
// fanout has been published. Every channel attempt is isolated: a failing
// provider becomes a recorded outcome in the aggregate result list, never an
// error on the request.

use crate::application::templates;
use crate::domain::{ContactDetails, Queue};
use crate::port::ledger::WaitingEntry;
use crate::port::notify::{ChannelKind, NotificationChannel, OutboundMessage};
use std::sync::Arc;
use tracing::{debug, warn};

/// Positions 1..=this get a proactive notification after a mutation;
/// everyone further back polls or subscribes.
const NOTIFY_POSITION_THRESHOLD: i64 = 5;
/// Positions 2..=this get the SMS position alert.
const ALERT_POSITION_THRESHOLD: i64 = 3;

/// Result of one channel attempt.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub channel: ChannelKind,
    pub success: bool,
    /// Provider message ID on success, error text on failure.
    pub detail: String,
}

/// Routes lifecycle events to the configured channels.
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
    estimate_minutes: i64,
}

impl NotificationDispatcher {
    pub fn new(channels: Vec<Arc<dyn NotificationChannel>>, estimate_minutes: i64) -> Self {
        Self {
            channels,
            estimate_minutes,
        }
    }

    fn wait_minutes(&self, position: i64) -> i64 {
        position * self.estimate_minutes
    }

    async fn attempt(
        &self,
        kind: ChannelKind,
        to: &str,
        subject: Option<String>,
        body: String,
    ) -> Option<DispatchOutcome> {
        let channel = self.channels.iter().find(|c| c.kind() == kind)?;
        let message = OutboundMessage {
            to: to.to_string(),
            subject,
            body,
        };
        match channel.send(&message).await {
            Ok(id) => {
                debug!(channel = %kind, provider_id = %id, "notification delivered");
                Some(DispatchOutcome {
                    channel: kind,
                    success: true,
                    detail: id,
                })
            }
            Err(e) => {
                warn!(channel = %kind, error = %e, "notification delivery failed");
                Some(DispatchOutcome {
                    channel: kind,
                    success: false,
                    detail: e.to_string(),
                })
            }
        }
    }

    pub async fn send_welcome(&self, contact: &ContactDetails) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::new();
        if let Some(email) = &contact.email {
            let (subject, body) = templates::welcome_email(&contact.name);
            outcomes.extend(self.attempt(ChannelKind::Email, email, Some(subject), body).await);
        }
        if let Some(phone) = &contact.phone {
            let body = templates::welcome_sms(&contact.name);
            outcomes.extend(self.attempt(ChannelKind::Sms, phone, None, body).await);
        }
        outcomes
    }

    pub async fn send_queue_created(
        &self,
        queue: &Queue,
        owner: &ContactDetails,
    ) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::new();
        if let Some(email) = &owner.email {
            let (subject, body) = templates::queue_created_email(queue, &owner.name);
            outcomes.extend(self.attempt(ChannelKind::Email, email, Some(subject), body).await);
        }
        if let Some(phone) = &owner.phone {
            let body = templates::queue_created_sms(queue);
            outcomes.extend(self.attempt(ChannelKind::Sms, phone, None, body).await);
        }
        outcomes
    }

    pub async fn send_queue_joined(
        &self,
        queue: &Queue,
        position: i64,
        contact: &ContactDetails,
    ) -> Vec<DispatchOutcome> {
        let wait = self.wait_minutes(position);
        let mut outcomes = Vec::new();
        if let Some(email) = &contact.email {
            let (subject, body) = templates::queue_joined_email(&contact.name, queue, position, wait);
            outcomes.extend(self.attempt(ChannelKind::Email, email, Some(subject), body).await);
        }
        if let Some(phone) = &contact.phone {
            let body = templates::queue_joined_sms(&contact.name, queue, position, wait);
            outcomes.extend(self.attempt(ChannelKind::Sms, phone, None, body).await);
        }
        outcomes
    }

    pub async fn send_your_turn(
        &self,
        queue: &Queue,
        contact: &ContactDetails,
    ) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::new();
        if let Some(email) = &contact.email {
            let (subject, body) = templates::your_turn_email(&contact.name, queue);
            outcomes.extend(self.attempt(ChannelKind::Email, email, Some(subject), body).await);
        }
        if let Some(phone) = &contact.phone {
            let body = templates::your_turn_sms(&contact.name, queue);
            outcomes.extend(self.attempt(ChannelKind::Sms, phone, None, body).await);
        }
        outcomes
    }

    pub async fn send_queue_update(
        &self,
        queue: &Queue,
        position: i64,
        contact: &ContactDetails,
    ) -> Vec<DispatchOutcome> {
        let wait = self.wait_minutes(position);
        let mut outcomes = Vec::new();
        if let Some(email) = &contact.email {
            let (subject, body) = templates::queue_update_email(&contact.name, queue, position, wait);
            outcomes.extend(self.attempt(ChannelKind::Email, email, Some(subject), body).await);
        }
        if let Some(phone) = &contact.phone {
            let body = templates::queue_update_sms(&contact.name, queue, position, wait);
            outcomes.extend(self.attempt(ChannelKind::Sms, phone, None, body).await);
        }
        outcomes
    }

    /// Position alert is SMS-only.
    pub async fn send_position_alert(
        &self,
        queue: &Queue,
        position: i64,
        contact: &ContactDetails,
    ) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::new();
        if let Some(phone) = &contact.phone {
            let body = templates::position_alert_sms(&contact.name, queue, position);
            outcomes.extend(self.attempt(ChannelKind::Sms, phone, None, body).await);
        }
        outcomes
    }

    /// Position-based routing over the fresh WAITING snapshot after a
    /// serve/skip/leave: position 1 gets the urgent your-turn message,
    /// 2..=3 the position alert, 4..=5 a generic update, everyone past the
    /// threshold nothing.
    pub async fn notify_after_mutation(
        &self,
        queue: &Queue,
        snapshot: &[WaitingEntry],
    ) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::new();
        for entry in snapshot
            .iter()
            .filter(|w| w.position <= NOTIFY_POSITION_THRESHOLD)
        {
            let batch = if entry.position == 1 {
                self.send_your_turn(queue, &entry.contact).await
            } else if entry.position <= ALERT_POSITION_THRESHOLD {
                self.send_position_alert(queue, entry.position, &entry.contact)
                    .await
            } else {
                self.send_queue_update(queue, entry.position, &entry.contact)
                    .await
            };
            outcomes.extend(batch);
        }
        outcomes
    }
}
