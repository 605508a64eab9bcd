// Domain Layer - Pure business logic and entities

pub mod contact;
pub mod entry;
pub mod error;
pub mod queue;

// Re-exports
pub use contact::ContactDetails;
pub use entry::{EntryId, EntryStatus, Position, QueueEntry, UserId};
pub use error::DomainError;
pub use queue::{Queue, QueueId};
