//! Opaque built-in values
//!
//! An [`Opaque`] value has internal state that cannot be rebuilt from its
//! visible entries, so it can be shared and replaced but never duplicated.

use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Built-in family an opaque value descends from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpaqueKind {
    /// Point in time
    Date,
    /// Compiled pattern-matching engine
    Pattern,
    /// Fixed-width numeric buffer
    Bytes,
    /// Hash map built-in
    Map,
    /// Hash set built-in
    Set,
    /// Boxed primitive (number or string object)
    Boxed,
    /// Callable value
    Function,
    /// Suspended generator
    Generator,
}

impl OpaqueKind {
    /// Name of the built-in itself
    #[must_use]
    pub const fn builtin_name(self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Pattern => "Pattern",
            Self::Bytes => "Bytes",
            Self::Map => "Map",
            Self::Set => "Set",
            Self::Boxed => "Boxed",
            Self::Function => "Function",
            Self::Generator => "Generator",
        }
    }
}

struct Inner {
    kind: OpaqueKind,
    type_name: Arc<str>,
    payload: Box<dyn Any + Send + Sync>,
}

/// Shared handle to an opaque built-in value
#[derive(Clone)]
pub struct Opaque(Arc<Inner>);

impl Opaque {
    /// Opaque value of a built-in kind
    #[must_use]
    pub fn new(kind: OpaqueKind, payload: impl Any + Send + Sync) -> Self {
        Self::subtype(kind, kind.builtin_name(), payload)
    }

    /// Opaque value of a user-defined subtype of a built-in
    #[must_use]
    pub fn subtype(
        kind: OpaqueKind,
        type_name: impl Into<Arc<str>>,
        payload: impl Any + Send + Sync,
    ) -> Self {
        Self(Arc::new(Inner {
            kind,
            type_name: type_name.into(),
            payload: Box::new(payload),
        }))
    }

    /// Built-in family
    #[inline]
    #[must_use]
    pub fn kind(&self) -> OpaqueKind {
        self.0.kind
    }

    /// Concrete type name (the subtype name if one was given)
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.0.type_name
    }

    /// Borrow the payload as `T`
    #[must_use]
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.0.payload.downcast_ref::<T>()
    }

    /// True if both handles refer to the same value
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for Opaque {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opaque")
            .field("kind", &self.0.kind)
            .field("type_name", &self.0.type_name)
            .finish_non_exhaustive()
    }
}
