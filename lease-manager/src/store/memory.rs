use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::HashMap;
use async_trait::async_trait;
use parking_lot::Mutex;

use lease_core::{Invalid, LeaseInfo, LeaseKey, MutateError, RefreshError, Request, Snapshot, Store};

/// A [`Store`] backed by an in-process map.
///
/// Suitable for tests and single-process deployments; `refresh` is a no-op
/// since there is no upstream to reconcile with. Tests can use
/// [`MemoryStore::inject_invalid`] to exercise the claim handler's
/// stale-snapshot retry path (§4.2 step 3) without a second writer.
pub struct MemoryStore {
    leases: Mutex<HashMap<LeaseKey, LeaseInfo>>,
    inject_invalid: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            leases: Mutex::new(HashMap::default()),
            inject_invalid: AtomicUsize::new(0),
        }
    }

    /// Seed the store with a pre-existing lease, bypassing `claim_lease`.
    /// Used by tests that need a populated starting state.
    pub fn seed(&self, key: LeaseKey, info: LeaseInfo) {
        self.leases.lock().insert(key, info);
    }

    /// Arm the next `n` mutation calls to return [`MutateError::Invalid`]
    /// instead of being applied, simulating contention from a concurrent
    /// writer.
    pub fn inject_invalid(&self, n: usize) {
        self.inject_invalid.store(n, Ordering::SeqCst);
    }

    fn take_injected_invalid(&self) -> bool {
        self.inject_invalid
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n > 0).then_some(n - 1))
            .is_ok()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn leases(&self) -> Snapshot {
        self.leases.lock().clone()
    }

    async fn claim_lease(&self, key: &LeaseKey, request: &Request) -> Result<(), MutateError> {
        if self.take_injected_invalid() {
            return Err(Invalid(key.clone()).into());
        }
        let mut leases = self.leases.lock();
        if leases.contains_key(key) {
            return Err(Invalid(key.clone()).into());
        }
        leases.insert(key.clone(), LeaseInfo::new(request.holder.clone(), lease_expiry(request)));
        Ok(())
    }

    async fn extend_lease(&self, key: &LeaseKey, request: &Request) -> Result<(), MutateError> {
        if self.take_injected_invalid() {
            return Err(Invalid(key.clone()).into());
        }
        let mut leases = self.leases.lock();
        match leases.get(key) {
            Some(info) if info.held_by(&request.holder) => {
                leases.insert(key.clone(), LeaseInfo::new(request.holder.clone(), lease_expiry(request)));
                Ok(())
            }
            _ => Err(Invalid(key.clone()).into()),
        }
    }

    async fn expire_lease(&self, key: &LeaseKey) -> Result<(), MutateError> {
        if self.take_injected_invalid() {
            return Err(Invalid(key.clone()).into());
        }
        let mut leases = self.leases.lock();
        if leases.remove(key).is_some() {
            Ok(())
        } else {
            Err(Invalid(key.clone()).into())
        }
    }

    async fn refresh(&self) -> Result<(), RefreshError> {
        Ok(())
    }
}

fn lease_expiry(request: &Request) -> tokio::time::Instant {
    tokio::time::Instant::now() + request.duration
}
