// Port Layer - Interfaces for external dependencies

pub mod broadcast;
pub mod id_provider; // For deterministic testing
pub mod ledger;
pub mod notify;
pub mod repository;
pub mod time_provider;

// Re-exports
pub use broadcast::{
    BroadcastError, NewJoin, PositionUpdate, QueueBroadcast, QueueSummary, RealtimeEvent,
};
pub use id_provider::IdProvider;
pub use ledger::{LedgerTransaction, Transaction, TransactionalLedger, WaitingEntry};
pub use notify::{ChannelError, ChannelKind, NotificationChannel, OutboundMessage};
pub use repository::{QueueRepository, QueueStats};
pub use time_provider::TimeProvider;
