// Lineup Infrastructure - Notification Channels
// Implements: NotificationChannel (email and SMS provider adapters)
//
// Providers are fire-and-forget collaborators: every failure here becomes a
// recorded dispatch outcome upstream, never an error on the lifecycle
// request.

mod email;
mod sms;

pub use email::{EmailProviderConfig, HttpEmailChannel};
pub use sms::{HttpSmsChannel, SmsProviderConfig};
