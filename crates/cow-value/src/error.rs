//! Errors raised by direct container operations

use crate::container::ContainerKind;
use crate::flags::Restriction;
use crate::key::Key;

/// Container operation rejected by entry flags, restriction, or kind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// Entry is read-only
    #[error("cannot assign to read-only entry '{key}'")]
    NotWritable { key: Key },

    /// Entry cannot be removed or reconfigured
    #[error("cannot remove or reconfigure entry '{key}'")]
    NotConfigurable { key: Key },

    /// Container rejects new keys
    #[error("cannot add entry '{key}' to a {restriction} container")]
    NotExtensible { key: Key, restriction: Restriction },

    /// Container restriction forbids the operation
    #[error("operation not permitted on a {0} container")]
    Restricted(Restriction),

    /// Operation requires a different container kind
    #[error("expected a {expected:?}, got a {actual:?}")]
    WrongKind {
        expected: ContainerKind,
        actual: ContainerKind,
    },

    /// Sequence index too far past the end to pad
    #[error("index {index} is out of range for a sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Computed entry has no setter
    #[error("computed entry '{key}' has no setter")]
    NoSetter { key: Key },
}
