mod common;

use common::{harness, harness_with_pool, post_draft, wait_until};
use serde_json::json;
use std::time::Duration;

use wayfare_lib::application::services::queue_service::REQUEST_QUEUE_KEY;
use wayfare_lib::domain::entities::sync::{MutationOutcome, RequestDescriptor};
use wayfare_lib::domain::value_objects::{HttpMethod, QueryKey, RequestPayload, ResourcePath};
use wayfare_lib::infrastructure::database::ConnectionPool;

fn topup_descriptor() -> RequestDescriptor {
    RequestDescriptor::new(
        HttpMethod::Post,
        ResourcePath::parse("/wallet/topup").unwrap(),
    )
}

/// Three top-ups submitted offline replay in order on reconnect, the storage
/// key disappears, and the cached wallet queries are invalidated.
#[tokio::test]
async fn offline_topups_replay_in_order_on_reconnect() {
    let h = harness(false).await;

    h.cache
        .put(&QueryKey::parse("wallet").unwrap(), json!({ "balance": 100 }))
        .await;
    h.cache
        .put(&QueryKey::parse("wallet-history").unwrap(), json!([]))
        .await;
    let invalidation = h
        .cache
        .spawn_invalidation_listener(h.queue.subscribe_events());
    let reconnect = h.queue.spawn_reconnect_drain(h.connectivity.subscribe());

    h.queue
        .enqueue(post_draft("/wallet/topup", json!({ "amount": 1 })))
        .await
        .unwrap();
    h.queue
        .enqueue(post_draft("/wallet/topup", json!({ "amount": 2 })))
        .await
        .unwrap();
    h.queue
        .enqueue(post_draft("/wallet/topup", json!({ "amount": 3 })))
        .await
        .unwrap();
    assert_eq!(h.queue.queue_size(), 3);
    assert!(h.backend.calls().await.is_empty());

    // connectivity returns; the reconnect listener drains the queue
    h.probe.set_online(true);
    h.connectivity.refresh().await;

    let queue = h.queue.clone();
    wait_until(Duration::from_secs(2), move || queue.queue_size() == 0).await;

    let calls = h.backend.calls().await;
    assert_eq!(calls.len(), 3);
    let amounts: Vec<i64> = calls
        .iter()
        .map(|(_, _, payload)| payload.as_ref().unwrap()["amount"].as_i64().unwrap())
        .collect();
    assert_eq!(amounts, vec![1, 2, 3]);

    // storage key removed, not rewritten as an empty list
    let store = wayfare_lib::infrastructure::storage::SqliteKvStore::new(h.pool.get_pool().clone());
    use wayfare_lib::application::ports::KeyValueStore;
    assert!(store.get(REQUEST_QUEUE_KEY).await.unwrap().is_none());

    // full drain invalidated cached queries
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if h.cache.stale_count().await == 2 {
            break;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("cache was not invalidated after the full drain");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    invalidation.abort();
    reconnect.abort();
}

/// A server-rejected request stays queued while accepted ones are removed,
/// and succeeds on a later pass once the backend accepts it.
#[tokio::test]
async fn rejected_request_is_retained_until_it_succeeds() {
    let h = harness(false).await;

    h.queue
        .enqueue(post_draft("/wallet/topup", json!({ "amount": 10 })))
        .await
        .unwrap();
    h.queue
        .enqueue(post_draft("/wallet/withdraw", json!({ "amount": 900 })))
        .await
        .unwrap();

    h.backend.reject_path("/wallet/withdraw").await;
    h.probe.set_online(true);
    h.connectivity.refresh().await;

    let report = h.queue.drain().await.unwrap();
    assert_eq!(report.replayed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(h.queue.queue_size(), 1);

    let pending = h.queue.pending_requests().await.unwrap();
    assert_eq!(pending[0].path.as_str(), "/wallet/withdraw");
    assert!(pending[0].last_error.is_some());

    // next pass, the backend accepts the withdrawal
    h.backend.accept_all().await;
    let report = h.queue.drain().await.unwrap();
    assert_eq!(report.replayed, 1);
    assert_eq!(h.queue.queue_size(), 0);
}

/// While online, the mutation wrapper never touches the queue and returns
/// the backend's response as-is.
#[tokio::test]
async fn online_mutation_bypasses_queue() {
    let h = harness(true).await;

    let outcome = h
        .mutations
        .execute(
            topup_descriptor(),
            Some(RequestPayload::new(json!({ "amount": 500 })).unwrap()),
        )
        .await
        .unwrap();

    assert_eq!(outcome, MutationOutcome::Executed(json!({ "ok": true })));
    assert_eq!(h.queue.queue_size(), 0);
    assert_eq!(h.backend.calls().await.len(), 1);
}

/// Requests queued before a process restart are still there afterwards and
/// drain normally: nothing is lost when the app is killed mid-offline.
#[tokio::test]
async fn queue_survives_process_restart() {
    let dir = tempfile::tempdir().unwrap();
    let database_url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("wayfare.db").display()
    );

    {
        let pool = ConnectionPool::new(&database_url, 1).await.unwrap();
        let h = harness_with_pool(pool, false).await;
        h.queue
            .enqueue(post_draft("/orders", json!({ "items": ["pilau"] })))
            .await
            .unwrap();
        h.queue
            .enqueue(post_draft("/tickets", json!({ "route": "cbd-westlands" })))
            .await
            .unwrap();
        h.pool.close().await;
    }

    let pool = ConnectionPool::new(&database_url, 1).await.unwrap();
    let h = harness_with_pool(pool, true).await;
    assert_eq!(h.queue.queue_size(), 2);

    let report = h.queue.drain().await.unwrap();
    assert_eq!(report.replayed, 2);
    assert_eq!(
        h.backend.called_paths().await,
        vec!["/orders".to_string(), "/tickets".to_string()]
    );
}
