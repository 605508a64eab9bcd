//! Position ledger invariants against the real SQLite store.
//!
//! After any sequence of join/serve/skip/leave operations, the WAITING
//! entries of a queue, sorted by position, are exactly 1..N.

use lineup_core::application::queue_ops::{
    CreateQueueRequest, EntryAction, JoinRequest, RemoveEntryRequest, UpdateEntryRequest,
};
use lineup_core::application::{
    ChangeNotifier, NotificationDispatcher, QueueOpsService, DEFAULT_SERVICE_ESTIMATE_MINUTES,
};
use lineup_core::domain::ContactDetails;
use lineup_core::error::AppError;
use lineup_core::port::broadcast::mocks::RecordingBroadcast;
use lineup_core::port::id_provider::mocks::SequentialIdProvider;
use lineup_core::port::time_provider::mocks::SteppingTimeProvider;
use lineup_core::port::QueueRepository;
use lineup_infra_sqlite::{create_pool, run_migrations, SqliteLedger, SqliteQueueRepository};
use std::sync::Arc;

struct TestApp {
    service: QueueOpsService,
    repo: SqliteQueueRepository,
}

fn db_path(test: &str) -> String {
    let path = std::env::temp_dir().join(format!("lineup_{}_{}.db", test, std::process::id()));
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
    path.display().to_string()
}

async fn setup(test: &str) -> TestApp {
    let pool = create_pool(&db_path(test)).await.unwrap();
    run_migrations(&pool).await.unwrap();

    let notifier = Arc::new(ChangeNotifier::new(
        Arc::new(RecordingBroadcast::new()),
        DEFAULT_SERVICE_ESTIMATE_MINUTES,
    ));
    let dispatcher = Arc::new(NotificationDispatcher::new(
        Vec::new(),
        DEFAULT_SERVICE_ESTIMATE_MINUTES,
    ));
    let service = QueueOpsService::new(
        Arc::new(SqliteLedger::new(pool.clone())),
        Arc::new(SqliteQueueRepository::new(pool.clone())),
        notifier,
        dispatcher,
        Arc::new(SequentialIdProvider::new("id")),
        Arc::new(SteppingTimeProvider::new(1_000, 1_000)),
        DEFAULT_SERVICE_ESTIMATE_MINUTES,
    );

    TestApp {
        service,
        repo: SqliteQueueRepository::new(pool),
    }
}

async fn create_queue(app: &TestApp) -> String {
    app.service
        .create_queue(CreateQueueRequest {
            owner_id: "owner-1".to_string(),
            name: "Front Desk".to_string(),
            capacity: None,
            category: None,
            location: None,
            custom_fields: Vec::new(),
            owner_contact: None,
        })
        .await
        .unwrap()
        .queue
        .id
}

async fn join(app: &TestApp, queue_id: &str, name: &str) -> String {
    app.service
        .join(JoinRequest {
            queue_id: queue_id.to_string(),
            user_id: None,
            contact: ContactDetails::new(name),
        })
        .await
        .unwrap()
        .entry_id
}

async fn assert_dense(app: &TestApp, queue_id: &str) -> Vec<(String, i64)> {
    let snapshot = app
        .repo
        .waiting_snapshot(&queue_id.to_string())
        .await
        .unwrap();
    for (i, w) in snapshot.iter().enumerate() {
        assert_eq!(
            w.position,
            i as i64 + 1,
            "gap or duplicate at index {i}: {:?}",
            snapshot
                .iter()
                .map(|w| (w.entry_id.clone(), w.position))
                .collect::<Vec<_>>()
        );
    }
    snapshot
        .into_iter()
        .map(|w| (w.entry_id, w.position))
        .collect()
}

#[tokio::test]
async fn test_joins_build_dense_sequence() {
    let app = setup("joins_dense").await;
    let queue_id = create_queue(&app).await;

    for i in 1..=5i64 {
        let entry_id = join(&app, &queue_id, &format!("Guest {i}")).await;
        let positions = assert_dense(&app, &queue_id).await;
        assert_eq!(positions.last().unwrap(), &(entry_id, i));
    }
}

#[tokio::test]
async fn test_skip_head_of_five() {
    let app = setup("skip_head").await;
    let queue_id = create_queue(&app).await;

    let mut ids = Vec::new();
    for i in 1..=5 {
        ids.push(join(&app, &queue_id, &format!("Guest {i}")).await);
    }

    app.service
        .update_entry(UpdateEntryRequest {
            queue_id: queue_id.clone(),
            entry_id: ids[0].clone(),
            caller_id: "owner-1".to_string(),
            action: EntryAction::Skip,
        })
        .await
        .unwrap();

    let positions = assert_dense(&app, &queue_id).await;
    assert_eq!(
        positions,
        vec![
            (ids[1].clone(), 1),
            (ids[2].clone(), 2),
            (ids[3].clone(), 3),
            (ids[4].clone(), 4),
            (ids[0].clone(), 5),
        ]
    );
}

#[tokio::test]
async fn test_second_serve_is_surfaced_and_harmless() {
    let app = setup("serve_idempotent").await;
    let queue_id = create_queue(&app).await;

    let first = join(&app, &queue_id, "Ada").await;
    join(&app, &queue_id, "Grace").await;
    join(&app, &queue_id, "Edsger").await;

    let serve = UpdateEntryRequest {
        queue_id: queue_id.clone(),
        entry_id: first.clone(),
        caller_id: "owner-1".to_string(),
        action: EntryAction::Serve,
    };
    app.service.update_entry(serve.clone()).await.unwrap();
    let after_first = assert_dense(&app, &queue_id).await;

    let err = app.service.update_entry(serve).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    // No additional decrement happened
    assert_eq!(assert_dense(&app, &queue_id).await, after_first);
}

#[tokio::test]
async fn test_density_through_mixed_operation_sequence() {
    let app = setup("mixed_ops").await;
    let queue_id = create_queue(&app).await;

    let mut ids = Vec::new();
    for i in 1..=6 {
        ids.push(join(&app, &queue_id, &format!("Guest {i}")).await);
    }

    // serve head
    app.service
        .update_entry(UpdateEntryRequest {
            queue_id: queue_id.clone(),
            entry_id: ids[0].clone(),
            caller_id: "owner-1".to_string(),
            action: EntryAction::Serve,
        })
        .await
        .unwrap();
    assert_dense(&app, &queue_id).await;

    // skip the new head
    app.service
        .update_entry(UpdateEntryRequest {
            queue_id: queue_id.clone(),
            entry_id: ids[1].clone(),
            caller_id: "owner-1".to_string(),
            action: EntryAction::Skip,
        })
        .await
        .unwrap();
    assert_dense(&app, &queue_id).await;

    // a middle entry leaves
    app.service
        .remove_entry(RemoveEntryRequest {
            queue_id: queue_id.clone(),
            entry_id: ids[3].clone(),
            caller_id: "owner-1".to_string(),
        })
        .await
        .unwrap();
    assert_dense(&app, &queue_id).await;

    // a latecomer joins at the tail
    let late = join(&app, &queue_id, "Late Guest").await;
    let positions = assert_dense(&app, &queue_id).await;
    assert_eq!(positions.len(), 5);
    assert_eq!(positions.last().unwrap(), &(late, 5));
}

#[tokio::test]
async fn test_served_entries_are_retained() {
    let app = setup("retention").await;
    let queue_id = create_queue(&app).await;
    let entry_id = join(&app, &queue_id, "Ada").await;

    app.service
        .update_entry(UpdateEntryRequest {
            queue_id: queue_id.clone(),
            entry_id: entry_id.clone(),
            caller_id: "owner-1".to_string(),
            action: EntryAction::Serve,
        })
        .await
        .unwrap();

    // Terminal rows stay queryable for analytics
    let entry = app.repo.find_entry(&entry_id).await.unwrap().unwrap();
    assert_eq!(entry.status.to_string(), "SERVED");
    assert!(entry.served_at.is_some());
}
