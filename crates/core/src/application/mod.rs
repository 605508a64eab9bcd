// Application Layer - Use Cases and Business Logic

pub mod dispatch;
pub mod fanout;
pub mod ledger;
pub mod queue_ops;
pub mod templates;

// Re-exports
pub use dispatch::{DispatchOutcome, NotificationDispatcher};
pub use fanout::{ChangeNotifier, SnapshotReconciler, DEFAULT_SERVICE_ESTIMATE_MINUTES};
pub use queue_ops::QueueOpsService;
