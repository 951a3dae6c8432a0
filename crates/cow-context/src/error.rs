//! Error types for edit sessions
//!
//! Every failure is synchronous and leaves no partially linked clone chain
//! behind.

use cow_value::{Key, ValueError};

/// Edit context failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// Value's type cannot be duplicated
    #[error("{type_name} values are not supported for cloning")]
    NotCloneable { type_name: String },

    /// Context was finalized or revoked
    #[error("this context has been revoked and can no longer be used")]
    Revoked,

    /// Entry is computed (getter/setter) and has no stable value
    #[error("computed entry '{key}' is unsupported")]
    UnsupportedAccessor { key: Key },

    /// Navigation or assignment through a scalar
    #[error("cannot access '{key}' on a {type_name} value")]
    NotAContainer { key: Key, type_name: String },

    /// Container operation rejected the edit
    #[error(transparent)]
    Value(#[from] ValueError),
}

impl EditError {
    /// Create a not-cloneable error
    pub fn not_cloneable(type_name: impl Into<String>) -> Self {
        Self::NotCloneable {
            type_name: type_name.into(),
        }
    }

    /// Create a not-a-container error
    pub fn not_a_container(key: Key, type_name: impl Into<String>) -> Self {
        Self::NotAContainer {
            key,
            type_name: type_name.into(),
        }
    }

    /// True if this signals use of a context past its lifetime
    #[inline]
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        matches!(self, Self::Revoked)
    }
}

/// Result type alias for edit operations
pub type EditResult<T> = Result<T, EditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_cloneable_display() {
        let err = EditError::not_cloneable("FunDate");
        assert_eq!(
            err.to_string(),
            "FunDate values are not supported for cloning"
        );
    }

    #[test]
    fn revoked_display() {
        assert_eq!(
            EditError::Revoked.to_string(),
            "this context has been revoked and can no longer be used"
        );
        assert!(EditError::Revoked.is_revoked());
    }

    #[test]
    fn value_errors_convert() {
        let err: EditError = ValueError::NotWritable {
            key: Key::from("year"),
        }
        .into();
        assert!(matches!(err, EditError::Value(_)));
        assert_eq!(err.to_string(), "cannot assign to read-only entry 'year'");
    }
}
