//! Entry attribute flags and container restriction levels

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Per-entry attribute flags
///
/// The relaxed default (all `true`) never blocks an edit. Anything else
/// is a restriction that must be reproduced when a container is copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryFlags {
    /// Value may be reassigned
    pub writable: bool,

    /// Entry may be removed or have its flags changed
    pub configurable: bool,

    /// Entry is visible when enumerating the container
    pub enumerable: bool,
}

impl EntryFlags {
    /// All flags set
    pub const RELAXED: Self = Self {
        writable: true,
        configurable: true,
        enumerable: true,
    };

    /// Non-writable, non-configurable, still enumerable
    pub const LOCKED: Self = Self {
        writable: false,
        configurable: false,
        enumerable: true,
    };

    /// Build flags explicitly
    #[inline]
    #[must_use]
    pub const fn new(writable: bool, configurable: bool, enumerable: bool) -> Self {
        Self {
            writable,
            configurable,
            enumerable,
        }
    }

    /// True if the flags would block a reassignment or removal
    #[inline]
    #[must_use]
    pub const fn is_restrictive(self) -> bool {
        !self.writable || !self.configurable
    }

    /// Same flags with writable and configurable switched on
    #[inline]
    #[must_use]
    pub const fn relaxed(self) -> Self {
        Self {
            writable: true,
            configurable: true,
            enumerable: self.enumerable,
        }
    }

    /// Same flags with writable set
    #[inline]
    #[must_use]
    pub const fn with_writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// Same flags with configurable set
    #[inline]
    #[must_use]
    pub const fn with_configurable(mut self, configurable: bool) -> Self {
        self.configurable = configurable;
        self
    }

    /// Same flags with enumerable set
    #[inline]
    #[must_use]
    pub const fn with_enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = enumerable;
        self
    }
}

impl Default for EntryFlags {
    fn default() -> Self {
        Self::RELAXED
    }
}

/// Whole-container mutability restriction
///
/// Levels are ordered; a container's level can only ever increase.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Restriction {
    /// No restriction
    #[default]
    Extensible,

    /// New keys are rejected
    NonExtensible,

    /// New keys rejected, no entry can be removed or reconfigured
    Sealed,

    /// Sealed, and every data entry is read-only
    Frozen,
}

impl Restriction {
    /// True if new keys may be added
    #[inline]
    #[must_use]
    pub const fn allows_new_keys(self) -> bool {
        matches!(self, Self::Extensible)
    }

    /// Human-readable name
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Extensible => "extensible",
            Self::NonExtensible => "non-extensible",
            Self::Sealed => "sealed",
            Self::Frozen => "frozen",
        }
    }
}

impl Display for Restriction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relaxed_is_not_restrictive() {
        assert!(!EntryFlags::RELAXED.is_restrictive());
        assert!(EntryFlags::LOCKED.is_restrictive());
        assert!(EntryFlags::RELAXED.with_writable(false).is_restrictive());
        assert!(!EntryFlags::RELAXED.with_enumerable(false).is_restrictive());
    }

    #[test]
    fn relaxing_keeps_enumerability() {
        let hidden = EntryFlags::new(false, false, false);
        assert_eq!(hidden.relaxed(), EntryFlags::new(true, true, false));
    }

    #[test]
    fn restriction_ordering() {
        assert!(Restriction::Extensible < Restriction::NonExtensible);
        assert!(Restriction::NonExtensible < Restriction::Sealed);
        assert!(Restriction::Sealed < Restriction::Frozen);
        assert!(Restriction::Extensible.allows_new_keys());
        assert!(!Restriction::Sealed.allows_new_keys());
    }
}
