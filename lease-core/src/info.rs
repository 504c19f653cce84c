use std::fmt;
use std::sync::Arc;

use tokio::time::Instant;

use crate::error::CheckError;

/// Opaque key a caller supplies to redeem a [`Trapdoor`].
///
/// Carried by the `Check` message; its only role is to be compared against
/// the key the trapdoor closure was constructed with.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TrapdoorKey(
    /// The raw key value.
    pub String,
);

/// A capability attesting that a lease was held by a specific holder at the
/// moment a check was performed.
///
/// Downstream operations that must not proceed under a stale holder accept
/// a `Trapdoor` rather than trusting a holder name string: the trapdoor can
/// only be produced by the manager at check time, and redeeming it requires
/// the matching [`TrapdoorKey`].
#[derive(Clone)]
pub struct Trapdoor {
    inner: Arc<dyn Fn(&TrapdoorKey) -> Result<(), CheckError> + Send + Sync>,
}

impl Trapdoor {
    /// Build a trapdoor bound to a single expected key.
    #[must_use]
    pub fn new(expected: TrapdoorKey) -> Self {
        Self {
            inner: Arc::new(move |presented: &TrapdoorKey| {
                if presented == &expected {
                    Ok(())
                } else {
                    Err(CheckError::KeyMismatch)
                }
            }),
        }
    }

    /// Redeem the trapdoor, attesting the lease was held when it was issued.
    pub fn attest(&self, key: &TrapdoorKey) -> Result<(), CheckError> {
        (self.inner)(key)
    }
}

impl fmt::Debug for Trapdoor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trapdoor").finish_non_exhaustive()
    }
}

/// The authoritative record a [`crate::store::Store`] holds for a granted
/// lease.
#[derive(Clone, Debug)]
pub struct LeaseInfo {
    /// The entity currently entitled to act as this lease's holder.
    pub holder: String,
    /// Absolute time after which the lease is considered expired.
    pub expiry: Instant,
    /// Capability proving the lease was held at the moment it was issued.
    pub trapdoor: Trapdoor,
}

impl LeaseInfo {
    /// Construct a fresh record, minting a trapdoor keyed by `holder` and
    /// `expiry` so that two grants never share a trapdoor key by accident.
    #[must_use]
    pub fn new(holder: impl Into<String>, expiry: Instant) -> Self {
        let holder = holder.into();
        let trapdoor_key = TrapdoorKey(format!("{holder}@{expiry:?}"));
        Self {
            holder,
            expiry,
            trapdoor: Trapdoor::new(trapdoor_key),
        }
    }

    /// `true` if `candidate` is this lease's current holder.
    #[must_use]
    pub fn held_by(&self, candidate: &str) -> bool {
        self.holder == candidate
    }

    /// `true` if `now` is at or past this lease's expiry.
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expiry <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn trapdoor_rejects_mismatched_key() {
        let info = LeaseInfo::new("node1", Instant::now());
        assert!(info.trapdoor.attest(&TrapdoorKey("wrong".into())).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn held_by_compares_holder_name() {
        let info = LeaseInfo::new("node1", Instant::now());
        assert!(info.held_by("node1"));
        assert!(!info.held_by("node2"));
    }
}
