//! Per-key single-flight construction guarantees.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use searchgate_client::{ClientHandle, ClientPool, PoolError, SearchClient};
use serde_json::json;
use tests::mocks::MockSearchClient;
use tokio::sync::Notify;

use crate::{test_client, test_key};

fn make_handle() -> ClientHandle {
    Arc::new(MockSearchClient::new(json!({ "ok": true })))
}

#[tokio::test]
async fn test_concurrent_callers_observe_one_construction() {
    let pool = Arc::new(ClientPool::new(5));
    let key = test_key("ds1");
    let constructions = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let pool = Arc::clone(&pool);
        let key = key.clone();
        let constructions = Arc::clone(&constructions);
        handles.push(tokio::spawn(async move {
            pool.get_or_create(&key, move || async move {
                constructions.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok(make_handle())
            })
            .await
            .unwrap()
        }));
    }

    let mut clients = Vec::new();
    for handle in handles {
        clients.push(handle.await.unwrap());
    }

    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    assert!(clients
        .windows(2)
        .all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    assert_eq!(pool.len(), 1);
}

#[tokio::test]
async fn test_distinct_keys_never_wait_on_each_other() {
    let pool = Arc::new(ClientPool::new(5));
    let gate = Arc::new(Notify::new());

    // Key A's construction blocks until we release it.
    let blocked = {
        let pool = Arc::clone(&pool);
        let gate = Arc::clone(&gate);
        let key = test_key("ds-blocked");
        tokio::spawn(async move {
            pool.get_or_create(&key, move || async move {
                gate.notified().await;
                Ok(make_handle())
            })
            .await
            .unwrap()
        })
    };

    // Key B completes while A is still in flight.
    let other = tokio::time::timeout(
        Duration::from_secs(1),
        pool.get_or_create(&test_key("ds-free"), || async { Ok(make_handle()) }),
    )
    .await
    .expect("independent key should not wait")
    .unwrap();
    assert_eq!(pool.len(), 1);
    drop(other);

    gate.notify_one();
    blocked.await.unwrap();
    assert_eq!(pool.len(), 2);
}

#[tokio::test]
async fn test_failure_is_shared_and_nothing_is_inserted() {
    let pool = Arc::new(ClientPool::new(5));
    let key = test_key("ds1");
    let attempts = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let pool = Arc::clone(&pool);
        let key = key.clone();
        let attempts = Arc::clone(&attempts);
        handles.push(tokio::spawn(async move {
            pool.get_or_create(&key, move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                anyhow::bail!("engine unreachable")
            })
            .await
        }));
    }

    for handle in handles {
        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, PoolError::Construction(_)));
        assert!(err.to_string().contains("engine unreachable"));
    }

    // One shared attempt, no entry, and the key is free for a retry.
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(pool.is_empty());
    assert!(pool.get(&key).is_none());

    let recovered = pool.get_or_create(&key, || async { Ok(make_handle()) }).await;
    assert!(recovered.is_ok());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancelled_initiator_still_populates_the_pool() {
    let pool = Arc::new(ClientPool::new(5));
    let key = test_key("ds1");
    let completions = Arc::new(AtomicUsize::new(0));

    let initiator = {
        let pool = Arc::clone(&pool);
        let key = key.clone();
        let completions = Arc::clone(&completions);
        tokio::spawn(async move {
            pool.get_or_create(&key, move || async move {
                tokio::time::sleep(Duration::from_millis(60)).await;
                completions.fetch_add(1, Ordering::SeqCst);
                Ok(make_handle())
            })
            .await
        })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    initiator.abort();

    // Construction keeps running in its own task and installs the client.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(completions.load(Ordering::SeqCst), 1);
    assert!(pool.get(&key).is_some());

    // A later caller reuses it without a second construction.
    let handle = pool.get_or_create(&key, || async { Ok(make_handle()) }).await.unwrap();
    assert_eq!(completions.load(Ordering::SeqCst), 1);
    drop(handle);
}

#[tokio::test]
async fn test_get_is_non_blocking_while_construction_is_in_flight() {
    let pool = Arc::new(ClientPool::new(5));
    let key = test_key("ds1");
    let gate = Arc::new(Notify::new());

    let pending = {
        let pool = Arc::clone(&pool);
        let key = key.clone();
        let gate = Arc::clone(&gate);
        tokio::spawn(async move {
            pool.get_or_create(&key, move || async move {
                gate.notified().await;
                Ok(make_handle())
            })
            .await
            .unwrap()
        })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    // In-flight construction reports absent instead of blocking.
    assert!(pool.get(&key).is_none());
    assert_eq!(pool.len(), 0);

    gate.notify_one();
    pending.await.unwrap();
    assert!(pool.get(&key).is_some());
}

#[tokio::test]
async fn test_ready_entry_is_returned_without_invoking_factory() {
    let pool = ClientPool::new(5);
    let key = test_key("ds1");
    let (mock, handle) = test_client();

    let first = pool
        .get_or_create(&key, move || async move { Ok(handle) })
        .await
        .unwrap();
    assert_eq!(first.id(), mock.id());

    let second = pool
        .get_or_create(&key, || async { panic!("factory must not run on a hit") })
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}
