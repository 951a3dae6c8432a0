//! Path segments
//!
//! Provides [`Key`], the single step used to address an entry inside a
//! [`Container`](crate::Container).

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// One segment of a path into a value tree
///
/// Records are addressed by name, sequences by index. A sequence also
/// accepts names for its side properties, and a record accepts indices
/// as ordinary keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// Named entry
    Name(Arc<str>),

    /// Positional entry
    Index(usize),
}

impl Key {
    /// Create a named key
    #[inline]
    #[must_use]
    pub fn name(name: impl Into<Arc<str>>) -> Self {
        Self::Name(name.into())
    }

    /// Name, if this is a named key
    #[inline]
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Index(_) => None,
        }
    }

    /// Index, if this is a positional key
    #[inline]
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Name(_) => None,
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Name(Arc::from(name))
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Name(Arc::from(name))
    }
}

impl From<Arc<str>> for Key {
    fn from(name: Arc<str>) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}
