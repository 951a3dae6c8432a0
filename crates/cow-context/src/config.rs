//! Session options

use serde::{Deserialize, Serialize};

/// How containers are duplicated on first write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloneMode {
    /// Keep class tag, hidden and computed entries; restore flags and
    /// restrictions at finalize
    #[default]
    Strict,

    /// Plain container of the same kind holding only the enumerable
    /// entries' values; nothing is restored
    Loose,
}

/// When a non-container root is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootCheck {
    /// Accept any root; clone failures surface on the first write
    #[default]
    Lenient,

    /// Reject scalar and opaque roots when the session is opened
    Strict,
}

/// Options for one edit session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditOptions {
    /// Cloning strategy
    pub clone_mode: CloneMode,

    /// Root validation
    pub root_check: RootCheck,
}

impl EditOptions {
    /// Default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With clone mode
    #[inline]
    #[must_use]
    pub fn with_clone_mode(mut self, clone_mode: CloneMode) -> Self {
        self.clone_mode = clone_mode;
        self
    }

    /// With root check
    #[inline]
    #[must_use]
    pub fn with_root_check(mut self, root_check: RootCheck) -> Self {
        self.root_check = root_check;
        self
    }

    /// Loose cloning, lenient root
    #[inline]
    #[must_use]
    pub fn loose() -> Self {
        Self::new().with_clone_mode(CloneMode::Loose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = EditOptions::default();
        assert_eq!(options.clone_mode, CloneMode::Strict);
        assert_eq!(options.root_check, RootCheck::Lenient);
    }

    #[test]
    fn builder() {
        let options = EditOptions::new()
            .with_clone_mode(CloneMode::Loose)
            .with_root_check(RootCheck::Strict);
        assert_eq!(options.clone_mode, CloneMode::Loose);
        assert_eq!(options.root_check, RootCheck::Strict);
    }

    #[test]
    fn deserialize_partial() {
        let options: EditOptions = serde_json::from_str(r#"{"root_check": "strict"}"#).unwrap();
        assert_eq!(options.clone_mode, CloneMode::Strict);
        assert_eq!(options.root_check, RootCheck::Strict);
    }
}
