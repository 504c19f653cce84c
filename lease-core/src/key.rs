use std::fmt;

/// Identity of a lease: `(Namespace, ModelUUID, Lease)`.
///
/// Two keys are equal iff all three components match, and the total
/// order used by the expiry scheduler (see [`crate::store::Store`]) is
/// lexicographic over the three fields in this declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LeaseKey {
    /// Namespace the lease lives in.
    pub namespace: String,
    /// UUID of the model (or equivalent scoping entity) the lease belongs to.
    pub model_uuid: String,
    /// Name of the lease itself.
    pub lease: String,
}

impl LeaseKey {
    /// Build a fully-qualified key.
    #[must_use]
    pub fn new(namespace: impl Into<String>, model_uuid: impl Into<String>, lease: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            model_uuid: model_uuid.into(),
            lease: lease.into(),
        }
    }

    /// Build a key with an empty namespace and model UUID, for callers that
    /// don't need the full three-part identity.
    #[must_use]
    pub fn simple(lease: impl Into<String>) -> Self {
        Self {
            namespace: String::new(),
            model_uuid: String::new(),
            lease: lease.into(),
        }
    }
}

impl fmt::Display for LeaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.model_uuid, self.lease)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_lexicographically_by_namespace_then_model_then_lease() {
        let mut keys = vec![
            LeaseKey::new("A", "u2", "b"),
            LeaseKey::new("A", "u1", "x"),
            LeaseKey::new("A", "u1", "a"),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                LeaseKey::new("A", "u1", "a"),
                LeaseKey::new("A", "u1", "x"),
                LeaseKey::new("A", "u2", "b"),
            ]
        );
    }

    #[test]
    fn simple_key_has_empty_scope_fields() {
        let key = LeaseKey::simple("db");
        assert_eq!(key.namespace, "");
        assert_eq!(key.model_uuid, "");
        assert_eq!(key.lease, "db");
    }
}
