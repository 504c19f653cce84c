use std::sync::Arc;
use std::time::Duration;

use lease_core::{Clock, ConfigError, Secretary, Store};

/// Fully validated configuration for a [`crate::Manager`] instance.
///
/// Construct via [`ConfigBuilder::finish`].
pub struct Config {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) secretary: Arc<dyn Secretary>,
    pub(crate) max_sleep: Duration,
    pub(crate) entity_uuid: String,
}

/// Builder for [`Config`].
///
/// Mirrors the required/optional field split of the coordination core this
/// crate is descended from: `store`, `clock` and `secretary` are the
/// injected collaborators, `max_sleep` bounds loop idleness, and
/// `entity_uuid` is carried only for log correlation.
pub struct ConfigBuilder {
    /// The store instance backing this manager. Required.
    pub store: Option<Arc<dyn Store>>,
    /// The clock source driving the expiry scheduler. Required.
    pub clock: Option<Arc<dyn Clock>>,
    /// The validator for lease names, holders, and durations. Required.
    pub secretary: Option<Arc<dyn Secretary>>,
    /// Upper bound on how long the loop may sleep between ticks. Required,
    /// must be a positive duration.
    pub max_sleep: Option<Duration>,
    /// Opaque identity used only for log correlation; its first six
    /// characters become the tracing span's log context.
    pub entity_uuid: String,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            store: None,
            clock: None,
            secretary: None,
            max_sleep: None,
            entity_uuid: String::new(),
        }
    }
}

impl ConfigBuilder {
    /// Start an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the store instance.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the clock source.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the secretary validator.
    #[must_use]
    pub fn secretary(mut self, secretary: Arc<dyn Secretary>) -> Self {
        self.secretary = Some(secretary);
        self
    }

    /// Set the maximum idle sleep between ticks.
    #[must_use]
    pub fn max_sleep(mut self, max_sleep: Duration) -> Self {
        self.max_sleep = Some(max_sleep);
        self
    }

    /// Set the log-correlation identity.
    #[must_use]
    pub fn entity_uuid(mut self, entity_uuid: impl Into<String>) -> Self {
        self.entity_uuid = entity_uuid.into();
        self
    }

    /// Validate this builder, producing a usable [`Config`].
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingField`] if `store`, `clock`,
    /// `secretary`, or `max_sleep` was never set, or
    /// [`ConfigError::NonPositiveMaxSleep`] if `max_sleep` is zero.
    pub fn finish(self) -> Result<Config, ConfigError> {
        let store = self.store.ok_or(ConfigError::MissingField("store"))?;
        let clock = self.clock.ok_or(ConfigError::MissingField("clock"))?;
        let secretary = self.secretary.ok_or(ConfigError::MissingField("secretary"))?;
        let max_sleep = self.max_sleep.ok_or(ConfigError::MissingField("max_sleep"))?;
        if max_sleep.is_zero() {
            return Err(ConfigError::NonPositiveMaxSleep(max_sleep));
        }
        Ok(Config {
            store,
            clock,
            secretary,
            max_sleep,
            entity_uuid: self.entity_uuid,
        })
    }
}

impl Config {
    /// The first six characters of the configured entity UUID, used to tag
    /// log output; empty if the UUID is shorter or unset.
    #[must_use]
    pub fn log_context(&self) -> &str {
        let uuid = &self.entity_uuid;
        let end = uuid.char_indices().nth(6).map_or(uuid.len(), |(idx, _)| idx);
        &uuid[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lease_core::PermissiveSecretary;

    struct NoopClock;

    #[async_trait::async_trait]
    impl Clock for NoopClock {
        fn now(&self) -> tokio::time::Instant {
            tokio::time::Instant::now()
        }
        async fn alarm(&self, _at: tokio::time::Instant) {}
    }

    fn builder_with(store: Arc<dyn Store>) -> ConfigBuilder {
        ConfigBuilder::new()
            .store(store)
            .clock(Arc::new(NoopClock))
            .secretary(Arc::new(PermissiveSecretary))
            .max_sleep(Duration::from_secs(30))
    }

    #[test]
    fn rejects_missing_fields() {
        let err = ConfigBuilder::new().finish().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("store")));
    }

    #[test]
    fn rejects_zero_max_sleep() {
        let store = crate::store::memory::MemoryStore::new();
        let err = builder_with(Arc::new(store))
            .max_sleep(Duration::ZERO)
            .finish()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveMaxSleep(_)));
    }

    #[test]
    fn log_context_truncates_to_six_chars() {
        let store = crate::store::memory::MemoryStore::new();
        let config = builder_with(Arc::new(store))
            .entity_uuid("0123456789abcdef")
            .finish()
            .unwrap();
        assert_eq!(config.log_context(), "012345");
    }
}
