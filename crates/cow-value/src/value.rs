//! The [`Value`] enum

use crate::container::{Container, ContainerKind};
use crate::key::Key;
use crate::opaque::Opaque;
use crate::path::IntoPath;
use std::sync::Arc;

/// Any node of a value tree
///
/// Scalars are compared by value; containers and opaque values are
/// reference-counted handles compared by identity (see [`Value::same`]).
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent or empty value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Immutable string
    Str(Arc<str>),
    /// Record or sequence
    Container(Container),
    /// Non-duplicable built-in
    Opaque(Opaque),
}

impl Value {
    /// Identity comparison
    ///
    /// Containers and opaque values are the same only if they are the same
    /// allocation. Floats are compared bitwise, except that every NaN is
    /// the same as every other NaN.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => {
                (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
            }
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Container(a), Self::Container(b)) => a.ptr_eq(b),
            (Self::Opaque(a), Self::Opaque(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// True for `Null`
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True for records and sequences
    #[inline]
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Container(_))
    }

    /// True for anything that is neither a container nor opaque
    #[inline]
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Container(_) | Self::Opaque(_))
    }

    /// Boolean content
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer content
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric content as float
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// String content
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Container handle
    #[inline]
    #[must_use]
    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Self::Container(c) => Some(c),
            _ => None,
        }
    }

    /// Opaque handle
    #[inline]
    #[must_use]
    pub fn as_opaque(&self) -> Option<&Opaque> {
        match self {
            Self::Opaque(o) => Some(o),
            _ => None,
        }
    }

    /// Type name used in diagnostics
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Container(c) => c.type_name(),
            Self::Opaque(o) => o.type_name(),
        }
    }

    /// Entry of a container value (`None` for non-containers and absent keys)
    #[must_use]
    pub fn get(&self, key: impl Into<Key>) -> Option<Self> {
        self.as_container().and_then(|c| c.get(key))
    }

    /// Follow a path of entries
    ///
    /// ```
    /// use cow_value::{path, Value};
    ///
    /// let v = Value::from(serde_json::json!({"people": [{"name": "Alice"}]}));
    /// assert_eq!(v.lookup(path!["people", 0, "name"]), Some(Value::from("Alice")));
    /// ```
    #[must_use]
    pub fn lookup(&self, path: impl IntoPath) -> Option<Self> {
        path.into_path()
            .iter()
            .try_fold(self.clone(), |value, key| value.get(key))
    }

    /// Empty record value
    #[must_use]
    pub fn record() -> Self {
        Self::Container(Container::record())
    }

    /// Empty sequence value
    #[must_use]
    pub fn sequence() -> Self {
        Self::Container(Container::sequence())
    }

    /// Container kind, if this is a container
    #[must_use]
    pub fn container_kind(&self) -> Option<ContainerKind> {
        self.as_container().map(Container::kind)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Self::Str(s)
    }
}

impl From<Container> for Value {
    fn from(c: Container) -> Self {
        Self::Container(c)
    }
}

impl From<&Container> for Value {
    fn from(c: &Container) -> Self {
        Self::Container(c.clone())
    }
}

impl From<Opaque> for Value {
    fn from(o: Opaque) -> Self {
        Self::Opaque(o)
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
