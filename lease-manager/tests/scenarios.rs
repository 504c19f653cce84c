use std::future::ready;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use lease_core::{Invalid, LeaseInfo, LeaseKey, ManagerError, MutateError, RefreshError, Request, Snapshot, Store};
use lease_manager::store::MemoryStore;
use lease_manager::{ClaimError, ConfigBuilder, Manager, PermissiveSecretary, SystemClock, WaitError};

fn spawn_manager(store: Arc<dyn Store>) -> Manager {
    let config = ConfigBuilder::new()
        .store(store)
        .clock(Arc::new(SystemClock))
        .secretary(Arc::new(PermissiveSecretary))
        .max_sleep(Duration::from_secs(60))
        .finish()
        .expect("valid config");
    Manager::spawn(config)
}

#[tokio::test(start_paused = true)]
async fn claim_succeeds_on_empty_store_then_denies_contender() {
    let manager = spawn_manager(Arc::new(MemoryStore::new()));
    let key = LeaseKey::simple("db");

    manager.claim(key.clone(), "node1", Duration::from_secs(30)).await.unwrap();

    let err = manager
        .claim(key, "node2", Duration::from_secs(30))
        .await
        .unwrap_err();
    assert!(matches!(err, ClaimError::Denied(_)));
}

#[tokio::test(start_paused = true)]
async fn extension_by_same_holder_succeeds() {
    let store = Arc::new(MemoryStore::new());
    let manager = spawn_manager(store.clone());
    let key = LeaseKey::simple("db");

    manager.claim(key.clone(), "node1", Duration::from_secs(10)).await.unwrap();
    let first_expiry = store.leases().await.get(&key).unwrap().expiry;

    tokio::time::advance(Duration::from_secs(1)).await;
    manager.claim(key.clone(), "node1", Duration::from_secs(30)).await.unwrap();
    let second_expiry = store.leases().await.get(&key).unwrap().expiry;

    assert!(second_expiry > first_expiry);
}

/// A store that simulates a concurrent writer: the first `claim_lease` call
/// reports `Invalid` and, in the same moment, plants another holder's
/// record — exactly scenario 3's "peer wrote concurrently".
struct RaceOnFirstClaim {
    inner: MemoryStore,
    first: AtomicBool,
}

#[async_trait]
impl Store for RaceOnFirstClaim {
    async fn leases(&self) -> Snapshot {
        self.inner.leases().await
    }

    async fn claim_lease(&self, key: &LeaseKey, request: &Request) -> Result<(), MutateError> {
        if self.first.swap(false, Ordering::SeqCst) {
            self.inner
                .seed(key.clone(), LeaseInfo::new("node2", tokio::time::Instant::now() + Duration::from_secs(30)));
            return Err(Invalid(key.clone()).into());
        }
        self.inner.claim_lease(key, request).await
    }

    async fn extend_lease(&self, key: &LeaseKey, request: &Request) -> Result<(), MutateError> {
        self.inner.extend_lease(key, request).await
    }

    async fn expire_lease(&self, key: &LeaseKey) -> Result<(), MutateError> {
        self.inner.expire_lease(key).await
    }

    async fn refresh(&self) -> Result<(), RefreshError> {
        self.inner.refresh().await
    }
}

#[tokio::test(start_paused = true)]
async fn stale_snapshot_retry_is_invisible_to_the_client() {
    let store = Arc::new(RaceOnFirstClaim {
        inner: MemoryStore::new(),
        first: AtomicBool::new(true),
    });
    let manager = spawn_manager(store);
    let key = LeaseKey::simple("db");

    let err = manager
        .claim(key, "node1", Duration::from_secs(30))
        .await
        .unwrap_err();
    assert!(matches!(err, ClaimError::Denied(_)));
}

/// Wraps `MemoryStore` to record the order `expire_lease` is invoked in.
struct RecordingExpire {
    inner: MemoryStore,
    order: Mutex<Vec<LeaseKey>>,
}

#[async_trait]
impl Store for RecordingExpire {
    async fn leases(&self) -> Snapshot {
        self.inner.leases().await
    }
    async fn claim_lease(&self, key: &LeaseKey, request: &Request) -> Result<(), MutateError> {
        self.inner.claim_lease(key, request).await
    }
    async fn extend_lease(&self, key: &LeaseKey, request: &Request) -> Result<(), MutateError> {
        self.inner.extend_lease(key, request).await
    }
    async fn expire_lease(&self, key: &LeaseKey) -> Result<(), MutateError> {
        self.order.lock().unwrap().push(key.clone());
        self.inner.expire_lease(key).await
    }
    async fn refresh(&self) -> Result<(), RefreshError> {
        self.inner.refresh().await
    }
}

#[tokio::test(start_paused = true)]
async fn tick_expires_in_lexicographic_order() {
    let inner = MemoryStore::new();
    let now = tokio::time::Instant::now();
    let already_expired = now - Duration::from_secs(1);
    inner.seed(LeaseKey::new("A", "u2", "b"), LeaseInfo::new("node1", already_expired));
    inner.seed(LeaseKey::new("A", "u1", "a"), LeaseInfo::new("node1", already_expired));
    inner.seed(LeaseKey::new("A", "u1", "x"), LeaseInfo::new("node1", already_expired));
    let store = Arc::new(RecordingExpire {
        inner,
        order: Mutex::new(Vec::new()),
    });
    let order_handle = Arc::clone(&store);

    let _manager = spawn_manager(store);
    for _ in 0..200 {
        tokio::task::yield_now().await;
        if order_handle.order.lock().unwrap().len() == 3 {
            break;
        }
    }

    let order = order_handle.order.lock().unwrap().clone();
    assert_eq!(
        order,
        vec![
            LeaseKey::new("A", "u1", "a"),
            LeaseKey::new("A", "u1", "x"),
            LeaseKey::new("A", "u2", "b"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn block_is_released_once_lease_expires() {
    let manager = spawn_manager(Arc::new(MemoryStore::new()));
    let key = LeaseKey::simple("db");
    manager.claim(key.clone(), "node1", Duration::from_secs(5)).await.unwrap();

    let wait = {
        let manager = manager.clone();
        let key = key.clone();
        tokio::spawn(async move { manager.wait_until_expired(key, std::future::pending()).await })
    };

    tokio::time::advance(Duration::from_secs(6)).await;
    let result = tokio::time::timeout(Duration::from_secs(5), wait).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[tokio::test(start_paused = true)]
async fn cancellation_returns_cancelled_without_affecting_the_lease() {
    let manager = spawn_manager(Arc::new(MemoryStore::new()));
    let key = LeaseKey::simple("db");
    manager.claim(key.clone(), "node1", Duration::from_secs(30)).await.unwrap();

    let result = manager.wait_until_expired(key.clone(), ready(())).await;
    assert!(matches!(result, Err(WaitError::Cancelled)));

    let token = manager.token(key, "node1");
    assert!(token.check().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn dead_manager_fails_every_call_with_the_same_error() {
    let manager = Manager::dead(ManagerError::Killed);
    let key = LeaseKey::simple("db");

    let claim_err = manager.claim(key.clone(), "node1", Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(claim_err, ClaimError::Stopped(ManagerError::Killed)));
    assert!(matches!(manager.wait().await, ManagerError::Killed));
}

#[tokio::test(start_paused = true)]
async fn kill_stops_the_manager_and_future_calls_observe_it() {
    let manager = spawn_manager(Arc::new(MemoryStore::new()));
    manager.kill();
    assert!(matches!(manager.wait().await, ManagerError::Killed));

    let key = LeaseKey::simple("db");
    let err = manager.claim(key, "node1", Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, ClaimError::Stopped(ManagerError::Killed)));
}

#[tokio::test(start_paused = true)]
async fn token_reports_not_held_for_a_different_holder() {
    let manager = spawn_manager(Arc::new(MemoryStore::new()));
    let key = LeaseKey::simple("db");
    manager.claim(key.clone(), "node1", Duration::from_secs(30)).await.unwrap();

    let token = manager.token(key, "node2");
    let err = token.check().await.unwrap_err();
    assert!(matches!(err, lease_manager::TokenError::NotHeld(_)));
}
