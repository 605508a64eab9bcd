// Notification Channel Port - best-effort outbound delivery
//
// Channels are unreliable collaborators with fire-and-forget semantics.
// Each attempt is isolated: a failing channel becomes a recorded outcome,
// never an error on the lifecycle request that triggered it.

use async_trait::async_trait;
use thiserror::Error;

/// Outbound channel kind. Routing only attempts a channel when the entry's
/// contact payload has a value for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Email,
    Sms,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKind::Email => write!(f, "email"),
            ChannelKind::Sms => write!(f, "sms"),
        }
    }
}

/// One rendered message. Email uses `subject` + HTML `body`; SMS uses `body`
/// only.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: Option<String>,
    pub body: String,
}

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("provider rejected message: {0}")]
    Provider(String),

    #[error("channel transport failed: {0}")]
    Transport(String),
}

/// A single outbound channel (email or SMS provider adapter).
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    /// Deliver one message; returns the provider message ID on success.
    async fn send(&self, message: &OutboundMessage) -> Result<String, ChannelError>;
}

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock channel behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Accept every message and return sequential provider IDs
        Accept,
        /// Fail every message with the given error text
        Fail(String),
    }

    /// Recording channel for dispatcher tests
    pub struct MockChannel {
        kind: ChannelKind,
        behavior: MockBehavior,
        sent: Arc<Mutex<Vec<OutboundMessage>>>,
    }

    impl MockChannel {
        pub fn new(kind: ChannelKind, behavior: MockBehavior) -> Self {
            Self {
                kind,
                behavior,
                sent: Arc::default(),
            }
        }

        pub fn new_accepting(kind: ChannelKind) -> Self {
            Self::new(kind, MockBehavior::Accept)
        }

        pub fn new_failing(kind: ChannelKind, message: impl Into<String>) -> Self {
            Self::new(kind, MockBehavior::Fail(message.into()))
        }

        /// Messages this channel accepted (failing channels record attempts
        /// too).
        pub fn sent(&self) -> Vec<OutboundMessage> {
            self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
        }
    }

    #[async_trait]
    impl NotificationChannel for MockChannel {
        fn kind(&self) -> ChannelKind {
            self.kind
        }

        async fn send(&self, message: &OutboundMessage) -> Result<String, ChannelError> {
            self.sent
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(message.clone());
            match &self.behavior {
                MockBehavior::Accept => {
                    let count = self.sent.lock().unwrap_or_else(|e| e.into_inner()).len();
                    Ok(format!("mock-{}-{}", self.kind, count))
                }
                MockBehavior::Fail(msg) => Err(ChannelError::Provider(msg.clone())),
            }
        }
    }
}
