use std::time::Duration;

use thiserror::Error;

use crate::key::LeaseKey;

/// Transient contention signal returned by [`crate::store::Store`] mutation
/// methods when the caller's snapshot was stale.
///
/// This is not part of [`StoreError`] because it is never fatal: every
/// caller of a fallible store method distinguishes it from the general
/// error case and retries (claim/extend) or ignores it (expire).
#[derive(Debug, Error)]
#[error("store snapshot for {0} was stale")]
pub struct Invalid(
    /// The key whose snapshot was stale.
    pub LeaseKey,
);

/// Fatal error returned by a [`crate::store::Store`] method.
///
/// Anything surfaced through this type ends the manager's event loop; it is
/// never shown to a client as a business outcome.
#[derive(Debug, Error)]
#[error("store operation failed: {0}")]
pub struct StoreError(
    /// The underlying failure.
    #[from]
    pub Box<dyn std::error::Error + Send + Sync>,
);

impl StoreError {
    /// Wrap an arbitrary error as a fatal store failure.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }
}

/// Outcome of a `Store::claim_lease` / `extend_lease` / `expire_lease` call.
///
/// Distinct from [`StoreError`] so call sites are forced to handle the
/// retry-on-`Invalid` path before any fatal error can reach the loop.
#[derive(Debug, Error)]
pub enum MutateError {
    /// The caller's snapshot was stale; re-read and retry.
    #[error(transparent)]
    Invalid(#[from] Invalid),
    /// Any other failure. Fatal.
    #[error(transparent)]
    Fatal(#[from] StoreError),
}

/// Error produced by a [`crate::secretary::Secretary`] validator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecretaryError {
    /// The lease name violates namespace-specific syntax.
    #[error("invalid lease name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Human-readable description of the violation.
        reason: String,
    },
    /// The holder name violates namespace-specific syntax.
    #[error("invalid holder {holder:?}: {reason}")]
    InvalidHolder {
        /// The rejected holder.
        holder: String,
        /// Human-readable description of the violation.
        reason: String,
    },
    /// The requested duration is out of range for this namespace.
    #[error("invalid duration {duration:?}: {reason}")]
    InvalidDuration {
        /// The rejected duration.
        duration: Duration,
        /// Human-readable description of the violation.
        reason: String,
    },
}

/// Error returned by [`crate::store::Store::refresh`].
#[derive(Debug, Error)]
#[error("store refresh failed: {0}")]
pub struct RefreshError(
    /// The underlying failure.
    #[from]
    pub Box<dyn std::error::Error + Send + Sync>,
);

/// Error configuring a manager instance.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field (`Store`, `Clock`, `Secretary`, `MaxSleep`) was not set.
    #[error("missing required manager config field: {0}")]
    MissingField(&'static str),
    /// `MaxSleep` was zero or negative.
    #[error("max_sleep must be a positive duration, got {0:?}")]
    NonPositiveMaxSleep(Duration),
}

/// Business outcome of a [`Claim`](crate::request::Request) call.
///
/// Distinguished from [`ManagerError`] because a denied claim is a normal,
/// expected outcome, not a fault: the event loop keeps running and the
/// caller is expected to retry or give up on its own schedule.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimError {
    /// Another holder currently holds the lease.
    #[error("lease {0} is held by another holder")]
    Denied(LeaseKey),
    /// The lease name, holder, or duration failed secretary validation.
    #[error(transparent)]
    Invalid(#[from] SecretaryError),
    /// The manager has shut down; see the carried terminal error.
    #[error(transparent)]
    Stopped(#[from] ManagerError),
}

/// Business outcome of a `Token` invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The asserted holder does not currently hold the lease.
    #[error("lease {0} is not held by the asserted holder")]
    NotHeld(LeaseKey),
    /// A trapdoor key was presented but did not match the one the lease was
    /// issued with.
    #[error(transparent)]
    Trapdoor(#[from] CheckError),
    /// The manager has shut down; see the carried terminal error.
    #[error(transparent)]
    Stopped(#[from] ManagerError),
}

/// Business outcome of a `WaitUntilExpired` call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WaitError {
    /// The caller's own cancellation signal fired before the lease expired.
    #[error("wait was cancelled by the caller")]
    Cancelled,
    /// The lease name failed secretary validation.
    #[error(transparent)]
    Invalid(#[from] SecretaryError),
    /// The manager has shut down; see the carried terminal error.
    #[error(transparent)]
    Stopped(#[from] ManagerError),
}

/// The terminal error a stopped manager exposes to every client call.
///
/// Once the event loop exits for any reason — a fatal store error, a
/// `Refresh` failure, or an explicit `Kill` — every outstanding and future
/// request observes one of these, never blocking forever (invariant I2).
#[derive(Debug, Error, Clone)]
pub enum ManagerError {
    /// `Kill` was called.
    #[error("manager was killed")]
    Killed,
    /// A store mutation method returned an error other than `Invalid`.
    #[error("store fault: {0}")]
    Store(String),
    /// `Store::refresh` returned an error.
    #[error("store refresh fault: {0}")]
    Refresh(String),
    /// The event loop task ended without a recorded cause (panicked or was
    /// dropped).
    #[error("manager loop ended unexpectedly")]
    LoopEnded,
}

impl PartialEq for ManagerError {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}
impl Eq for ManagerError {}

impl From<RefreshError> for ManagerError {
    fn from(err: RefreshError) -> Self {
        ManagerError::Refresh(err.0.to_string())
    }
}

impl From<StoreError> for ManagerError {
    fn from(err: StoreError) -> Self {
        ManagerError::Store(err.0.to_string())
    }
}

/// Error produced while attesting a [`crate::info::Trapdoor`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// The trapdoor key presented by the caller does not match the one the
    /// lease was issued with.
    #[error("trapdoor key mismatch")]
    KeyMismatch,
}
