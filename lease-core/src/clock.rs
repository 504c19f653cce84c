use async_trait::async_trait;
use tokio::time::Instant;

/// A source of time the event loop schedules expiry wakeups against.
///
/// Abstracted so tests can drive the loop with [`tokio::time::pause`] and
/// [`tokio::time::advance`] instead of real wall-clock sleeps; production
/// callers use [`SystemClock`].
#[async_trait]
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> Instant;

    /// Resolve once `at` has passed. The event loop selects on this
    /// alongside request channels, so it must be cancel-safe.
    async fn alarm(&self, at: Instant);
}

/// A [`Clock`] backed by the Tokio runtime's timer wheel.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn alarm(&self, at: Instant) {
        tokio::time::sleep_until(at).await;
    }
}
