use std::time::Duration;

/// An attempted mutation against a single lease: claim it, or extend it if
/// already held by `holder`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    /// The entity requesting to hold (or continue holding) the lease.
    pub holder: String,
    /// How long the grant should last from the moment it is applied.
    pub duration: Duration,
}

impl Request {
    /// Build a request.
    #[must_use]
    pub fn new(holder: impl Into<String>, duration: Duration) -> Self {
        Self {
            holder: holder.into(),
            duration,
        }
    }
}
