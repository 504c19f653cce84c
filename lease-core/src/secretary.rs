use std::time::Duration;

use crate::error::SecretaryError;

/// Validates lease names, holder names, and durations before they reach the
/// event loop.
///
/// Implementations are expected to vary their rules per namespace; the
/// trait itself carries no namespace concept, leaving that to whatever
/// wraps or parameterizes the implementation.
pub trait Secretary: Send + Sync {
    /// Validate a lease name.
    fn check_lease(&self, name: &str) -> Result<(), SecretaryError>;

    /// Validate a holder name.
    fn check_holder(&self, holder: &str) -> Result<(), SecretaryError>;

    /// Validate a requested duration.
    fn check_duration(&self, duration: Duration) -> Result<(), SecretaryError>;
}

/// A [`Secretary`] that accepts everything.
///
/// Useful for tests and for deployments that delegate validation elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissiveSecretary;

impl Secretary for PermissiveSecretary {
    fn check_lease(&self, _name: &str) -> Result<(), SecretaryError> {
        Ok(())
    }

    fn check_holder(&self, _holder: &str) -> Result<(), SecretaryError> {
        Ok(())
    }

    fn check_duration(&self, _duration: Duration) -> Result<(), SecretaryError> {
        Ok(())
    }
}

/// A [`Secretary`] that rejects empty names/holders and non-positive
/// durations, with no further namespacing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonEmptySecretary;

impl Secretary for NonEmptySecretary {
    fn check_lease(&self, name: &str) -> Result<(), SecretaryError> {
        if name.is_empty() {
            return Err(SecretaryError::InvalidName {
                name: name.to_string(),
                reason: "lease name must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn check_holder(&self, holder: &str) -> Result<(), SecretaryError> {
        if holder.is_empty() {
            return Err(SecretaryError::InvalidHolder {
                holder: holder.to_string(),
                reason: "holder must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn check_duration(&self, duration: Duration) -> Result<(), SecretaryError> {
        if duration.is_zero() {
            return Err(SecretaryError::InvalidDuration {
                duration,
                reason: "duration must be positive".to_string(),
            });
        }
        Ok(())
    }
}
