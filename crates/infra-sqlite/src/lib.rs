// Lineup Infrastructure - SQLite Adapter
// Implements: QueueRepository, TransactionalLedger

mod connection;
mod error;
mod ledger;
mod migration;
mod repository;
mod rows;

pub use connection::create_pool;
pub use ledger::{SqliteLedger, SqliteLedgerTransaction};
pub use migration::run_migrations;
pub use repository::SqliteQueueRepository;

// Note: sqlx::Error conversion is handled by the helper in error.rs
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for
// AppError here).
