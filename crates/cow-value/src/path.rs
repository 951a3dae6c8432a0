//! Paths into value trees
//!
//! Provides [`Path`] for addressing nested entries and [`IntoPath`] so
//! navigation calls accept keys, arrays of keys, or paths interchangeably.

use crate::key::Key;
use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Ordered sequence of keys locating a descendant value
///
/// # Examples
/// - `["birth_date", "year"]` → `birth_date.year`
/// - `[0, "birth_date"]` → `0.birth_date`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Path(SmallVec<[Key; 4]>);

impl Path {
    /// Empty path (the context itself)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(SmallVec::new())
    }

    /// Path from a single key
    #[inline]
    #[must_use]
    pub fn single(key: impl Into<Key>) -> Self {
        let mut segments = SmallVec::new();
        segments.push(key.into());
        Self(segments)
    }

    /// Path from any sequence of keys
    #[inline]
    #[must_use]
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    /// Path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Key] {
        &self.0
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parent path (if not empty)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.split_last().map(|(_, parent)| parent)
    }

    /// Last segment together with the path leading to it
    #[must_use]
    pub fn split_last(&self) -> Option<(&Key, Self)> {
        let (last, rest) = self.0.split_last()?;
        Some((last, Self(rest.iter().cloned().collect())))
    }

    /// Last segment (if not empty)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&Key> {
        self.0.last()
    }

    /// Append a segment, returning a new path
    #[inline]
    #[must_use]
    pub fn child(&self, key: impl Into<Key>) -> Self {
        let mut new = self.clone();
        new.0.push(key.into());
        new
    }

    /// Append a segment in place
    #[inline]
    pub fn push(&mut self, key: impl Into<Key>) {
        self.0.push(key.into());
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0[..] == other.0[..self.0.len()]
    }

    /// Iterator over segments from outermost to innermost
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.0.iter()
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    /// Parse a dotted path; all-digit segments become indices
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let segments = s
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment)
                } else if seg.bytes().all(|b| b.is_ascii_digit()) {
                    seg.parse::<usize>()
                        .map(Key::Index)
                        .map_err(|_| PathError::InvalidIndex(seg.to_string()))
                } else {
                    Ok(Key::from(seg))
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Key;
    type IntoIter = std::slice::Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Errors related to path parsing
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Index segment out of range
    #[error("invalid index segment: {0}")]
    InvalidIndex(String),
}

/// Anything usable as a navigation path
pub trait IntoPath {
    /// Convert into an owned path
    fn into_path(self) -> Path;
}

impl IntoPath for Path {
    fn into_path(self) -> Path {
        self
    }
}

impl IntoPath for &Path {
    fn into_path(self) -> Path {
        self.clone()
    }
}

impl IntoPath for Key {
    fn into_path(self) -> Path {
        Path::single(self)
    }
}

impl IntoPath for &str {
    fn into_path(self) -> Path {
        Path::single(self)
    }
}

impl IntoPath for String {
    fn into_path(self) -> Path {
        Path::single(self)
    }
}

impl IntoPath for usize {
    fn into_path(self) -> Path {
        Path::single(self)
    }
}

impl<K: Into<Key>, const N: usize> IntoPath for [K; N] {
    fn into_path(self) -> Path {
        Path::from_keys(self)
    }
}

impl<K: Into<Key>> IntoPath for Vec<K> {
    fn into_path(self) -> Path {
        Path::from_keys(self)
    }
}

impl<K: Into<Key> + Clone> IntoPath for &[K] {
    fn into_path(self) -> Path {
        Path::from_keys(self.iter().cloned())
    }
}

/// Build a [`Path`] from keys of mixed kinds
///
/// ```
/// use cow_value::{path, Key};
///
/// let p = path![0, "birth_date", "year"];
/// assert_eq!(p.segments()[0], Key::Index(0));
/// assert_eq!(p.to_string(), "0.birth_date.year");
/// ```
#[macro_export]
macro_rules! path {
    () => { $crate::Path::root() };
    ($($key:expr),+ $(,)?) => {
        $crate::Path::from_keys([$($crate::Key::from($key)),+])
    };
}
