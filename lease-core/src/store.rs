use ahash::HashMap;
use async_trait::async_trait;

use crate::error::{MutateError, RefreshError};
use crate::info::LeaseInfo;
use crate::key::LeaseKey;
use crate::request::Request;

/// A point-in-time view of every lease the store currently holds.
///
/// Must be cheap enough to call on every handler invocation and every tick
/// (§6); implementations that front a remote system should cache this
/// locally and rely on [`Store::refresh`] to reconcile it, rather than
/// making a round trip per call.
pub type Snapshot = HashMap<LeaseKey, LeaseInfo>;

/// The persistence and replication layer the manager's event loop is the
/// sole writer against.
///
/// The manager never mutates its own cache of leases; every decision reads
/// a fresh [`Store::leases`] snapshot at the moment of handling. A `Store`
/// may be backed by a Raft log, a SQL table, or an in-memory map — this
/// trait is the entire contract the event loop depends on.
#[async_trait]
pub trait Store: Send + Sync {
    /// Return the current snapshot of all leases.
    async fn leases(&self) -> Snapshot;

    /// Create a new lease at `key`, provided none exists there.
    ///
    /// Returns [`MutateError::Invalid`] if the caller's view of `key` was
    /// stale (someone else has since written to it); the caller is expected
    /// to re-read [`Store::leases`] and retry or reinterpret the outcome.
    async fn claim_lease(&self, key: &LeaseKey, request: &Request) -> Result<(), MutateError>;

    /// Extend an existing lease at `key`, provided `request.holder` already
    /// holds it.
    ///
    /// Same error discipline as [`Store::claim_lease`].
    async fn extend_lease(&self, key: &LeaseKey, request: &Request) -> Result<(), MutateError>;

    /// Remove the lease at `key` because it has expired.
    ///
    /// [`MutateError::Invalid`] is expected and harmless when another actor
    /// already expired or extended the lease first.
    async fn expire_lease(&self, key: &LeaseKey) -> Result<(), MutateError>;

    /// Force the store to reconcile its view with upstream truth.
    ///
    /// Called once per tick before expiry is evaluated, and once from the
    /// check handler on a holder mismatch, to give a replicated store a
    /// chance to observe state a concurrent writer has already committed.
    async fn refresh(&self) -> Result<(), RefreshError>;
}
