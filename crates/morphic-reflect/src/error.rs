//! Error types for reflection access

/// Errors raised while reading or writing members through the gateway
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReflectError {
    /// Value handed to an accessor is not of the declaring type
    #[error("type mismatch on '{member}': expected {expected}")]
    TypeMismatch {
        /// Member being accessed (or `<value>` for whole values)
        member: String,
        /// Expected type name
        expected: String,
    },

    /// Attempt to store null into a non-nullable member
    #[error("cannot assign null to non-nullable member '{0}'")]
    NullAssignment(String),

    /// Member has no read accessor
    #[error("member '{0}' is not readable")]
    NotReadable(String),

    /// Member has no write accessor
    #[error("member '{0}' is not writable")]
    NotWritable(String),

    /// Type was never registered with the catalog
    #[error("type not registered: {0}")]
    UnknownType(String),

    /// Type is registered but has no collection adapter
    #[error("type is not a collection: {0}")]
    NotACollection(String),
}

impl ReflectError {
    /// Create a type mismatch error for a member
    pub fn mismatch(member: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::TypeMismatch {
            member: member.into(),
            expected: expected.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_display() {
        let err = ReflectError::mismatch("name", "alloc::string::String");
        assert_eq!(
            err.to_string(),
            "type mismatch on 'name': expected alloc::string::String"
        );
    }

    #[test]
    fn null_assignment_display() {
        let err = ReflectError::NullAssignment("id".to_string());
        assert!(err.to_string().contains("non-nullable member 'id'"));
    }
}
