use ahash::HashMap;
use tokio::sync::oneshot;

use lease_core::{LeaseKey, Snapshot};

/// Registry of waiters keyed by the lease they're waiting on.
///
/// Not a graph — there are no dependencies between registrations, only a
/// set of independent unblock channels per key (§4.4). Re-examined after
/// every event-loop iteration: entries whose key is absent from the
/// current store snapshot are released.
#[derive(Default)]
pub(crate) struct Blocks {
    waiters: HashMap<LeaseKey, Vec<oneshot::Sender<()>>>,
}

impl Blocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new waiter on `key`.
    pub fn register(&mut self, key: LeaseKey, unblock: oneshot::Sender<()>) {
        self.waiters.entry(key).or_default().push(unblock);
    }

    /// Release every waiter whose key is absent from `snapshot`.
    ///
    /// Closing an already-abandoned channel (the client cancelled) has no
    /// observer and is harmless (scenario 6).
    pub fn release_absent(&mut self, snapshot: &Snapshot) {
        self.waiters.retain(|key, _| snapshot.contains_key(key));
    }

    #[cfg(test)]
    pub fn waiter_count(&self, key: &LeaseKey) -> usize {
        self.waiters.get(key).map_or(0, Vec::len)
    }
}
