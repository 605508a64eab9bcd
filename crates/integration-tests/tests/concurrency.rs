//! Concurrency tests: simultaneous mutations of one queue serialize at the
//! store and the density invariant survives, with contention surfacing only
//! as retryable conflicts.

use lineup_core::application::queue_ops::{
    CreateQueueRequest, EntryAction, JoinRequest, UpdateEntryRequest,
};
use lineup_core::application::{
    ChangeNotifier, NotificationDispatcher, QueueOpsService, DEFAULT_SERVICE_ESTIMATE_MINUTES,
};
use lineup_core::domain::ContactDetails;
use lineup_core::error::Result;
use lineup_core::port::broadcast::NoOpBroadcast;
use lineup_core::port::id_provider::UuidProvider;
use lineup_core::port::time_provider::SystemTimeProvider;
use lineup_core::port::QueueRepository;
use lineup_infra_sqlite::{create_pool, run_migrations, SqliteLedger, SqliteQueueRepository};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

fn db_path(test: &str) -> String {
    let path = std::env::temp_dir().join(format!("lineup_{}_{}.db", test, std::process::id()));
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
    path.display().to_string()
}

async fn setup(test: &str) -> (Arc<QueueOpsService>, SqliteQueueRepository) {
    let pool = create_pool(&db_path(test)).await.unwrap();
    run_migrations(&pool).await.unwrap();

    let service = Arc::new(QueueOpsService::new(
        Arc::new(SqliteLedger::new(pool.clone())),
        Arc::new(SqliteQueueRepository::new(pool.clone())),
        Arc::new(ChangeNotifier::new(
            Arc::new(NoOpBroadcast),
            DEFAULT_SERVICE_ESTIMATE_MINUTES,
        )),
        Arc::new(NotificationDispatcher::new(
            Vec::new(),
            DEFAULT_SERVICE_ESTIMATE_MINUTES,
        )),
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
        DEFAULT_SERVICE_ESTIMATE_MINUTES,
    ));
    (service, SqliteQueueRepository::new(pool))
}

async fn create_queue(service: &QueueOpsService) -> String {
    service
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

/// Retry a serve/skip while the store reports a retryable conflict.
async fn update_with_retries(
    service: Arc<QueueOpsService>,
    req: UpdateEntryRequest,
) -> Result<()> {
    let mut attempts: u64 = 0;
    loop {
        match service.update_entry(req.clone()).await {
            Err(e) if e.is_retryable() && attempts < 10 => {
                attempts += 1;
                tokio::time::sleep(Duration::from_millis(10 * attempts)).await;
            }
            other => return other.map(|_| ()),
        }
    }
}

/// Retry a join while the store reports a retryable conflict.
async fn join_with_retries(service: Arc<QueueOpsService>, req: JoinRequest) -> Result<i64> {
    let mut attempts: u64 = 0;
    loop {
        match service.join(req.clone()).await {
            Err(e) if e.is_retryable() && attempts < 10 => {
                attempts += 1;
                tokio::time::sleep(Duration::from_millis(10 * attempts)).await;
            }
            other => return other.map(|o| o.position),
        }
    }
}

async fn assert_dense(repo: &SqliteQueueRepository, queue_id: &str) -> usize {
    let snapshot = repo.waiting_snapshot(&queue_id.to_string()).await.unwrap();
    for (i, w) in snapshot.iter().enumerate() {
        assert_eq!(w.position, i as i64 + 1, "positions not dense");
    }
    snapshot.len()
}

#[tokio::test]
async fn test_two_simultaneous_serves_keep_density() {
    let (service, repo) = setup("two_serves").await;
    let queue_id = create_queue(&service).await;

    let mut ids = Vec::new();
    for i in 1..=6 {
        let outcome = service
            .join(JoinRequest {
                queue_id: queue_id.clone(),
                user_id: None,
                contact: ContactDetails::new(format!("Guest {i}")),
            })
            .await
            .unwrap();
        ids.push(outcome.entry_id);
    }

    // Serve the entries at positions 1 and 2 from two tasks at once. Order
    // is undefined but the operations must serialize: the loser observes
    // the winner's already-compacted positions.
    let mut tasks = JoinSet::new();
    for entry_id in [ids[0].clone(), ids[1].clone()] {
        let service = service.clone();
        let req = UpdateEntryRequest {
            queue_id: queue_id.clone(),
            entry_id,
            caller_id: "owner-1".to_string(),
            action: EntryAction::Serve,
        };
        tasks.spawn(update_with_retries(service, req));
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    assert_eq!(assert_dense(&repo, &queue_id).await, 4);
}

#[tokio::test]
async fn test_concurrent_joins_get_unique_positions() {
    let (service, repo) = setup("parallel_joins").await;
    let queue_id = create_queue(&service).await;

    let mut tasks = JoinSet::new();
    for i in 0..8 {
        let service = service.clone();
        let req = JoinRequest {
            queue_id: queue_id.clone(),
            user_id: None,
            contact: ContactDetails::new(format!("Guest {i}")),
        };
        tasks.spawn(join_with_retries(service, req));
    }

    let mut positions = Vec::new();
    while let Some(result) = tasks.join_next().await {
        positions.push(result.unwrap().unwrap());
    }
    positions.sort_unstable();
    assert_eq!(positions, (1..=8).collect::<Vec<i64>>());

    assert_eq!(assert_dense(&repo, &queue_id).await, 8);
}

#[tokio::test]
async fn test_serve_races_join() {
    let (service, repo) = setup("serve_vs_join").await;
    let queue_id = create_queue(&service).await;

    let mut ids = Vec::new();
    for i in 1..=5 {
        ids.push(
            service
                .join(JoinRequest {
                    queue_id: queue_id.clone(),
                    user_id: None,
                    contact: ContactDetails::new(format!("Guest {i}")),
                })
                .await
                .unwrap()
                .entry_id,
        );
    }

    let mut tasks = JoinSet::new();
    tasks.spawn(update_with_retries(
        service.clone(),
        UpdateEntryRequest {
            queue_id: queue_id.clone(),
            entry_id: ids[0].clone(),
            caller_id: "owner-1".to_string(),
            action: EntryAction::Serve,
        },
    ));
    {
        let service = service.clone();
        let req = JoinRequest {
            queue_id: queue_id.clone(),
            user_id: None,
            contact: ContactDetails::new("Rushing Guest"),
        };
        tasks.spawn(async move { join_with_retries(service, req).await.map(|_| ()) });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    // 5 waiting - 1 served + 1 joined
    assert_eq!(assert_dense(&repo, &queue_id).await, 5);
}
