//! Fanout through the real realtime hub: subscribers receive
//! sequence-numbered snapshots, urgent signals fire for the head of the
//! queue, and stale snapshots are discarded by the reconciler.

use lineup_core::application::queue_ops::{CreateQueueRequest, EntryAction, JoinRequest, UpdateEntryRequest};
use lineup_core::application::{
    ChangeNotifier, NotificationDispatcher, QueueOpsService, SnapshotReconciler,
    DEFAULT_SERVICE_ESTIMATE_MINUTES,
};
use lineup_core::domain::ContactDetails;
use lineup_core::port::broadcast::RealtimeEvent;
use lineup_core::port::id_provider::mocks::SequentialIdProvider;
use lineup_core::port::time_provider::mocks::SteppingTimeProvider;
use lineup_infra_realtime::{RealtimeHub, DEFAULT_TOPIC_CAPACITY};
use lineup_infra_sqlite::{create_pool, run_migrations, SqliteLedger, SqliteQueueRepository};
use std::sync::Arc;

fn db_path(test: &str) -> String {
    let path = std::env::temp_dir().join(format!("lineup_{}_{}.db", test, std::process::id()));
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
    path.display().to_string()
}

async fn setup(test: &str) -> (QueueOpsService, Arc<RealtimeHub>) {
    let pool = create_pool(&db_path(test)).await.unwrap();
    run_migrations(&pool).await.unwrap();

    let hub = Arc::new(RealtimeHub::new(DEFAULT_TOPIC_CAPACITY));
    let service = QueueOpsService::new(
        Arc::new(SqliteLedger::new(pool.clone())),
        Arc::new(SqliteQueueRepository::new(pool.clone())),
        Arc::new(ChangeNotifier::new(
            hub.clone(),
            DEFAULT_SERVICE_ESTIMATE_MINUTES,
        )),
        Arc::new(NotificationDispatcher::new(
            Vec::new(),
            DEFAULT_SERVICE_ESTIMATE_MINUTES,
        )),
        Arc::new(SequentialIdProvider::new("id")),
        Arc::new(SteppingTimeProvider::new(1_000, 1_000)),
        DEFAULT_SERVICE_ESTIMATE_MINUTES,
    );
    (service, hub)
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

#[tokio::test]
async fn test_subscriber_sees_summary_and_positions() {
    let (service, hub) = setup("fanout_basic").await;
    let queue_id = create_queue(&service).await;
    let mut sub = hub.subscribe("tab-1", &queue_id).await;

    service
        .join(JoinRequest {
            queue_id: queue_id.clone(),
            user_id: None,
            contact: ContactDetails::new("Ada"),
        })
        .await
        .unwrap();

    // queue-updated first
    match sub.receiver.recv().await.unwrap() {
        RealtimeEvent::QueueUpdated { summary } => {
            assert_eq!(summary.waiting_count, 1);
            assert_eq!(
                summary.estimated_wait_minutes,
                DEFAULT_SERVICE_ESTIMATE_MINUTES
            );
        }
        other => panic!("expected queue-updated, got {other:?}"),
    }

    // then the sequence-numbered position snapshot with the join marker
    match sub.receiver.recv().await.unwrap() {
        RealtimeEvent::PositionUpdated {
            sequence,
            updates,
            new_join,
        } => {
            assert_eq!(sequence, 1);
            assert_eq!(updates.len(), 1);
            assert_eq!(updates[0].position, 1);
            assert_eq!(new_join.unwrap().name, "Ada");
        }
        other => panic!("expected position-updated, got {other:?}"),
    }

    // position 1 also gets the urgent signal
    match sub.receiver.recv().await.unwrap() {
        RealtimeEvent::PositionUrgent { sequence, update } => {
            assert_eq!(sequence, 1);
            assert_eq!(update.position, 1);
        }
        other => panic!("expected position-urgent, got {other:?}"),
    }
}

#[tokio::test]
async fn test_sequences_increase_across_mutations() {
    let (service, hub) = setup("fanout_sequences").await;
    let queue_id = create_queue(&service).await;
    let mut sub = hub.subscribe("tab-1", &queue_id).await;

    let mut ids = Vec::new();
    for name in ["A", "B", "C"] {
        ids.push(
            service
                .join(JoinRequest {
                    queue_id: queue_id.clone(),
                    user_id: None,
                    contact: ContactDetails::new(name),
                })
                .await
                .unwrap()
                .entry_id,
        );
    }
    service
        .update_entry(UpdateEntryRequest {
            queue_id: queue_id.clone(),
            entry_id: ids[0].clone(),
            caller_id: "owner-1".to_string(),
            action: EntryAction::Serve,
        })
        .await
        .unwrap();

    let mut sequences = Vec::new();
    while let Ok(event) = sub.receiver.try_recv() {
        if let RealtimeEvent::PositionUpdated { sequence, .. } = event {
            sequences.push(sequence);
        }
    }
    assert_eq!(sequences, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_reconciler_survives_out_of_order_delivery() {
    let (service, hub) = setup("fanout_reorder").await;
    let queue_id = create_queue(&service).await;
    let mut sub = hub.subscribe("tab-1", &queue_id).await;

    for name in ["A", "B"] {
        service
            .join(JoinRequest {
                queue_id: queue_id.clone(),
                user_id: None,
                contact: ContactDetails::new(name),
            })
            .await
            .unwrap();
    }

    // Collect the two position snapshots and apply them newest-first,
    // simulating network jitter.
    let mut snapshots = Vec::new();
    while let Ok(event) = sub.receiver.try_recv() {
        if let RealtimeEvent::PositionUpdated {
            sequence, updates, ..
        } = event
        {
            snapshots.push((sequence, updates));
        }
    }
    assert_eq!(snapshots.len(), 2);

    let mut reconciler = SnapshotReconciler::new();
    let (late_seq, late_updates) = snapshots.pop().unwrap();
    let (early_seq, early_updates) = snapshots.pop().unwrap();

    assert!(reconciler.apply(late_seq, &late_updates));
    // The earlier snapshot arrives afterwards and must be discarded
    assert!(!reconciler.apply(early_seq, &early_updates));

    assert_eq!(reconciler.last_sequence(), Some(late_seq));
    // State still reflects the two-person queue of the late snapshot
    assert_eq!(late_updates.len(), 2);
    assert_eq!(reconciler.position_of(&late_updates[1].entry_id), Some(2));
}

#[tokio::test]
async fn test_fanout_without_subscribers_does_not_fail_requests() {
    let (service, _hub) = setup("fanout_nobody").await;
    let queue_id = create_queue(&service).await;

    // Nobody subscribed; the join must still succeed
    let outcome = service
        .join(JoinRequest {
            queue_id,
            user_id: None,
            contact: ContactDetails::new("Ada"),
        })
        .await
        .unwrap();
    assert_eq!(outcome.position, 1);
}
