//! Keyed records and indexed sequences
//!
//! A [`Container`] is a shared handle: cloning the handle never copies the
//! entries. Every entry carries [`EntryFlags`] and the container as a whole
//! carries a [`Restriction`]; both are enforced by the mutating operations
//! below, so a frozen container is effectively immutable.

use crate::error::ValueError;
use crate::flags::{EntryFlags, Restriction};
use crate::key::Key;
use crate::value::Value;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Concrete container variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// Keyed mapping, insertion ordered
    Record,

    /// Ordered sequence with optional named side properties
    Sequence,
}

/// Computes an entry's value on read
pub type Getter = Arc<dyn Fn() -> Value + Send + Sync>;

/// Receives an entry's value on write
pub type Setter = Arc<dyn Fn(Value) + Send + Sync>;

/// Computed entry with no stored value
#[derive(Clone, Default)]
pub struct Accessor {
    getter: Option<Getter>,
    setter: Option<Setter>,
}

impl Accessor {
    /// Read-only computed entry
    #[must_use]
    pub fn getter(getter: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self {
            getter: Some(Arc::new(getter)),
            setter: None,
        }
    }

    /// Add a setter
    #[must_use]
    pub fn with_setter(mut self, setter: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.setter = Some(Arc::new(setter));
        self
    }

    /// Evaluate the getter (`Null` when there is none)
    #[must_use]
    pub fn get(&self) -> Value {
        self.getter.as_ref().map_or(Value::Null, |getter| getter())
    }

    /// True if a setter is present
    #[inline]
    #[must_use]
    pub fn has_setter(&self) -> bool {
        self.setter.is_some()
    }
}

impl Debug for Accessor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

/// Stored or computed entry content
#[derive(Debug, Clone)]
pub enum Slot {
    /// Plain stored value
    Data(Value),

    /// Getter/setter pair
    Accessor(Accessor),
}

/// One entry of a container
#[derive(Debug, Clone)]
pub struct Entry {
    /// Entry content
    pub slot: Slot,

    /// Attribute flags
    pub flags: EntryFlags,
}

impl Entry {
    /// Data entry with relaxed flags
    #[inline]
    #[must_use]
    pub fn data(value: Value) -> Self {
        Self {
            slot: Slot::Data(value),
            flags: EntryFlags::RELAXED,
        }
    }

    /// Stored value, if this is a data entry
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match &self.slot {
            Slot::Data(value) => Some(value),
            Slot::Accessor(_) => None,
        }
    }

    /// True for computed entries
    #[inline]
    #[must_use]
    pub fn is_accessor(&self) -> bool {
        matches!(self.slot, Slot::Accessor(_))
    }

    /// Current value, evaluating the getter for computed entries
    #[must_use]
    pub fn resolve(&self) -> Value {
        match &self.slot {
            Slot::Data(value) => value.clone(),
            Slot::Accessor(accessor) => accessor.get(),
        }
    }
}

/// Largest run of `Null` padding a single index assignment may create
pub const MAX_INDEX_GAP: usize = 1 << 20;

#[derive(Debug, Default)]
struct State {
    elements: Vec<Entry>,
    props: IndexMap<Key, Entry>,
    restriction: Restriction,
}

impl State {
    fn entry(&self, kind: ContainerKind, key: &Key) -> Option<&Entry> {
        match (kind, key) {
            (ContainerKind::Sequence, Key::Index(i)) => self.elements.get(*i),
            _ => self.props.get(key),
        }
    }

    fn entry_mut(&mut self, kind: ContainerKind, key: &Key) -> Option<&mut Entry> {
        match (kind, key) {
            (ContainerKind::Sequence, Key::Index(i)) => self.elements.get_mut(*i),
            _ => self.props.get_mut(key),
        }
    }

    /// Insert a new entry; sequences are padded with `Null` up to `key`
    fn insert(&mut self, kind: ContainerKind, key: Key, entry: Entry) -> Result<(), ValueError> {
        match (kind, key) {
            (ContainerKind::Sequence, Key::Index(i)) => {
                let len = self.elements.len();
                if i < len {
                    self.elements[i] = entry;
                    return Ok(());
                }
                if i - len > MAX_INDEX_GAP {
                    return Err(ValueError::IndexOutOfRange { index: i, len });
                }
                self.elements
                    .try_reserve(i - len + 1)
                    .map_err(|_| ValueError::IndexOutOfRange { index: i, len })?;
                self.elements.resize_with(i, || Entry::data(Value::Null));
                self.elements.push(entry);
            }
            (_, key) => {
                self.props.insert(key, entry);
            }
        }
        Ok(())
    }

    fn entries_mut(&mut self) -> impl Iterator<Item = &mut Entry> {
        self.elements.iter_mut().chain(self.props.values_mut())
    }
}

struct Inner {
    kind: ContainerKind,
    class: Option<Arc<str>>,
    state: RwLock<State>,
}

/// Shared handle to a keyed record or indexed sequence
#[derive(Clone)]
pub struct Container(Arc<Inner>);

impl Container {
    fn with_kind(kind: ContainerKind, class: Option<Arc<str>>) -> Self {
        Self(Arc::new(Inner {
            kind,
            class,
            state: RwLock::new(State::default()),
        }))
    }

    /// Empty record
    #[must_use]
    pub fn record() -> Self {
        Self::with_kind(ContainerKind::Record, None)
    }

    /// Empty sequence
    #[must_use]
    pub fn sequence() -> Self {
        Self::with_kind(ContainerKind::Sequence, None)
    }

    /// Empty container tagged with a class name
    ///
    /// The class tag stands in for a specialized subtype and survives
    /// strict cloning.
    #[must_use]
    pub fn with_class(kind: ContainerKind, class: impl Into<Arc<str>>) -> Self {
        Self::with_kind(kind, Some(class.into()))
    }

    /// Record built from key/value pairs
    #[must_use]
    pub fn record_from<K, V, I>(entries: I) -> Self
    where
        K: Into<Key>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let container = Self::record();
        {
            let mut state = container.0.state.write();
            for (key, value) in entries {
                state.props.insert(key.into(), Entry::data(value.into()));
            }
        }
        container
    }

    /// Sequence built from values
    #[must_use]
    pub fn sequence_from<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let container = Self::sequence();
        container.0.state.write().elements = items
            .into_iter()
            .map(|item| Entry::data(item.into()))
            .collect();
        container
    }

    /// Empty, unrestricted container of the same kind and class
    #[must_use]
    pub fn new_like(&self) -> Self {
        Self::with_kind(self.0.kind, self.0.class.clone())
    }

    /// Container kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ContainerKind {
        self.0.kind
    }

    /// Class tag, if any
    #[inline]
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.0.class.as_deref()
    }

    /// Type name used in diagnostics
    #[must_use]
    pub fn type_name(&self) -> &str {
        match (self.class(), self.0.kind) {
            (Some(class), _) => class,
            (None, ContainerKind::Record) => "Record",
            (None, ContainerKind::Sequence) => "Sequence",
        }
    }

    /// True if both handles refer to the same container
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Stable address for identity-keyed bookkeeping
    #[inline]
    #[must_use]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }

    /// Number of own entries (elements for a sequence)
    #[must_use]
    pub fn len(&self) -> usize {
        let state = self.0.state.read();
        match self.0.kind {
            ContainerKind::Record => state.props.len(),
            ContainerKind::Sequence => state.elements.len(),
        }
    }

    /// True if [`len`](Self::len) is zero
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All own keys, enumerable or not
    ///
    /// Sequence indices come first, then named properties in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        let state = self.0.state.read();
        (0..state.elements.len())
            .map(Key::Index)
            .chain(state.props.keys().cloned())
            .collect()
    }

    /// Snapshot of all own entries
    #[must_use]
    pub fn entries(&self) -> Vec<(Key, Entry)> {
        let state = self.0.state.read();
        state
            .elements
            .iter()
            .enumerate()
            .map(|(i, entry)| (Key::Index(i), entry.clone()))
            .chain(state.props.iter().map(|(k, e)| (k.clone(), e.clone())))
            .collect()
    }

    /// Raw entry at `key`
    #[must_use]
    pub fn entry(&self, key: &Key) -> Option<Entry> {
        self.0.state.read().entry(self.0.kind, key).cloned()
    }

    /// True if `key` is an own entry
    #[must_use]
    pub fn contains(&self, key: &Key) -> bool {
        self.0.state.read().entry(self.0.kind, key).is_some()
    }

    /// Value at `key`, evaluating getters
    #[must_use]
    pub fn get(&self, key: impl Into<Key>) -> Option<Value> {
        self.entry(&key.into()).map(|entry| entry.resolve())
    }

    /// Flags of the entry at `key`
    #[must_use]
    pub fn flags(&self, key: &Key) -> Option<EntryFlags> {
        self.0
            .state
            .read()
            .entry(self.0.kind, key)
            .map(|entry| entry.flags)
    }

    /// Assign a value, honoring entry flags and the container restriction
    ///
    /// # Errors
    /// - [`ValueError::NotWritable`] if the entry is read-only
    /// - [`ValueError::NotExtensible`] if `key` is new and the container is restricted
    /// - [`ValueError::NoSetter`] for a computed entry without setter
    /// - [`ValueError::IndexOutOfRange`] if a sequence index lies more than
    ///   [`MAX_INDEX_GAP`] past the end
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<(), ValueError> {
        let key = key.into();
        let value = value.into();
        let setter = {
            let mut state = self.0.state.write();
            let restriction = state.restriction;
            match state.entry_mut(self.0.kind, &key) {
                Some(Entry {
                    slot: Slot::Data(current),
                    flags,
                }) => {
                    if !flags.writable {
                        return Err(ValueError::NotWritable { key });
                    }
                    *current = value;
                    return Ok(());
                }
                Some(Entry {
                    slot: Slot::Accessor(accessor),
                    ..
                }) => accessor.setter.clone(),
                None => {
                    if !restriction.allows_new_keys() {
                        return Err(ValueError::NotExtensible { key, restriction });
                    }
                    return state.insert(self.0.kind, key, Entry::data(value));
                }
            }
        };

        // setters run without the lock held
        match setter {
            Some(setter) => {
                setter(value);
                Ok(())
            }
            None => Err(ValueError::NoSetter { key }),
        }
    }

    /// Define a data entry with explicit flags
    ///
    /// # Errors
    /// Fails if the existing entry is not configurable, or if `key` is new
    /// and the container rejects new keys.
    pub fn define(
        &self,
        key: impl Into<Key>,
        value: impl Into<Value>,
        flags: EntryFlags,
    ) -> Result<(), ValueError> {
        self.define_entry(
            key.into(),
            Entry {
                slot: Slot::Data(value.into()),
                flags,
            },
        )
    }

    /// Define a computed entry
    ///
    /// # Errors
    /// Same conditions as [`define`](Self::define).
    pub fn define_accessor(
        &self,
        key: impl Into<Key>,
        accessor: Accessor,
        flags: EntryFlags,
    ) -> Result<(), ValueError> {
        self.define_entry(
            key.into(),
            Entry {
                slot: Slot::Accessor(accessor),
                flags,
            },
        )
    }

    /// Define an entry (data or computed) with its flags
    ///
    /// # Errors
    /// Same conditions as [`define`](Self::define).
    pub fn define_entry(&self, key: Key, entry: Entry) -> Result<(), ValueError> {
        let mut state = self.0.state.write();
        let restriction = state.restriction;
        match state.entry_mut(self.0.kind, &key) {
            Some(existing) => {
                if !existing.flags.configurable {
                    return Err(ValueError::NotConfigurable { key });
                }
                *existing = entry;
            }
            None => {
                if !restriction.allows_new_keys() {
                    return Err(ValueError::NotExtensible { key, restriction });
                }
                state.insert(self.0.kind, key, entry)?;
            }
        }
        Ok(())
    }

    /// Change the flags of an existing entry
    ///
    /// A non-configurable entry only accepts changes that tighten it
    /// (dropping `writable`). Returns `false` if `key` is absent.
    ///
    /// # Errors
    /// [`ValueError::NotConfigurable`] if the change is not permitted.
    pub fn set_flags(&self, key: &Key, flags: EntryFlags) -> Result<bool, ValueError> {
        let mut state = self.0.state.write();
        let Some(entry) = state.entry_mut(self.0.kind, key) else {
            return Ok(false);
        };
        let current = entry.flags;
        let permitted = current.configurable
            || (!flags.configurable
                && flags.enumerable == current.enumerable
                && (current.writable || !flags.writable));
        if !permitted {
            return Err(ValueError::NotConfigurable { key: key.clone() });
        }
        entry.flags = flags;
        Ok(true)
    }

    /// Remove an entry, returning its value
    ///
    /// Removing a sequence element shifts the following elements down.
    ///
    /// # Errors
    /// [`ValueError::NotConfigurable`] if the entry may not be removed.
    pub fn remove(&self, key: &Key) -> Result<Option<Value>, ValueError> {
        let mut state = self.0.state.write();
        let Some(entry) = state.entry(self.0.kind, key) else {
            return Ok(None);
        };
        if !entry.flags.configurable {
            return Err(ValueError::NotConfigurable { key: key.clone() });
        }
        let removed = match (self.0.kind, key) {
            (ContainerKind::Sequence, Key::Index(i)) => Some(state.elements.remove(*i)),
            _ => state.props.shift_remove(key),
        };
        Ok(removed.map(|entry| entry.resolve()))
    }

    /// Append to a sequence, returning the new element's index
    ///
    /// # Errors
    /// Fails on records and on restricted sequences.
    pub fn push(&self, value: impl Into<Value>) -> Result<usize, ValueError> {
        self.expect_kind(ContainerKind::Sequence)?;
        let mut state = self.0.state.write();
        let index = state.elements.len();
        if !state.restriction.allows_new_keys() {
            return Err(ValueError::NotExtensible {
                key: Key::Index(index),
                restriction: state.restriction,
            });
        }
        state.elements.push(Entry::data(value.into()));
        Ok(index)
    }

    /// Remove the last element of a sequence
    ///
    /// # Errors
    /// Fails on records and when the last element is not configurable.
    pub fn pop(&self) -> Result<Option<Value>, ValueError> {
        self.expect_kind(ContainerKind::Sequence)?;
        let len = self.len();
        if len == 0 {
            return Ok(None);
        }
        self.remove(&Key::Index(len - 1))
    }

    /// Shorten a sequence to `len` elements
    ///
    /// # Errors
    /// Fails on records and when any removed element is not configurable.
    pub fn truncate(&self, len: usize) -> Result<(), ValueError> {
        self.expect_kind(ContainerKind::Sequence)?;
        let mut state = self.0.state.write();
        if let Some(offset) = state
            .elements
            .iter()
            .skip(len)
            .position(|entry| !entry.flags.configurable)
        {
            return Err(ValueError::NotConfigurable {
                key: Key::Index(len + offset),
            });
        }
        state.elements.truncate(len);
        Ok(())
    }

    /// Current restriction level
    #[must_use]
    pub fn restriction(&self) -> Restriction {
        self.0.state.read().restriction
    }

    /// Reject new keys from now on
    pub fn prevent_extensions(&self) {
        self.restrict(Restriction::NonExtensible);
    }

    /// Reject new keys and lock every entry's configuration
    pub fn seal(&self) {
        self.restrict(Restriction::Sealed);
    }

    /// Seal and make every data entry read-only
    pub fn freeze(&self) {
        self.restrict(Restriction::Frozen);
    }

    /// Raise the restriction level; lower levels are ignored
    pub fn restrict(&self, level: Restriction) {
        let mut state = self.0.state.write();
        if level >= Restriction::Sealed {
            for entry in state.entries_mut() {
                entry.flags.configurable = false;
                if level == Restriction::Frozen && !entry.is_accessor() {
                    entry.flags.writable = false;
                }
            }
        }
        state.restriction = state.restriction.max(level);
    }

    /// True if new keys may be added
    #[inline]
    #[must_use]
    pub fn is_extensible(&self) -> bool {
        self.restriction().allows_new_keys()
    }

    /// True if sealed or frozen
    #[inline]
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.restriction() >= Restriction::Sealed
    }

    /// True if frozen
    #[inline]
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.restriction() == Restriction::Frozen
    }

    fn expect_kind(&self, expected: ContainerKind) -> Result<(), ValueError> {
        if self.0.kind == expected {
            Ok(())
        } else {
            Err(ValueError::WrongKind {
                expected,
                actual: self.0.kind,
            })
        }
    }
}

impl Debug for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // entries are not printed: containers may be cyclic
        f.debug_struct("Container")
            .field("type", &self.type_name())
            .field("len", &self.len())
            .field("restriction", &self.restriction())
            .field("addr", &format_args!("{:#x}", self.addr()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    fn person() -> Container {
        Container::record_from([("name", Value::from("Alice")), ("age", Value::from(30))])
    }

    #[test]
    fn record_get_and_set() {
        let record = person();
        assert_eq!(record.get("name"), Some(Value::from("Alice")));
        record.set("age", 31).unwrap();
        assert_eq!(record.get("age"), Some(Value::from(31)));
        assert_eq!(record.keys(), vec![Key::from("name"), Key::from("age")]);
    }

    #[test]
    fn sequence_set_pads_with_null() {
        let seq = Container::sequence_from([1, 2]);
        seq.set(4, 5).unwrap();
        assert_eq!(seq.len(), 5);
        assert_eq!(seq.get(2), Some(Value::Null));
        assert_eq!(seq.get(4), Some(Value::from(5)));
    }

    #[test]
    fn sequence_set_far_past_end_is_rejected() {
        let seq = Container::sequence_from([1]);
        assert_eq!(
            seq.set(usize::MAX, 2),
            Err(ValueError::IndexOutOfRange {
                index: usize::MAX,
                len: 1
            })
        );
        assert!(seq
            .define(MAX_INDEX_GAP + 2, 2, EntryFlags::RELAXED)
            .is_err());
        assert_eq!(seq.len(), 1);

        seq.set(MAX_INDEX_GAP + 1, 2).unwrap();
        assert_eq!(seq.len(), MAX_INDEX_GAP + 2);
    }

    #[test]
    fn sequence_side_properties() {
        let seq = Container::sequence_from([1]);
        seq.set("label", "numbers").unwrap();
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.keys(), vec![Key::from(0), Key::from("label")]);
    }

    #[test]
    fn frozen_rejects_writes() {
        let record = person();
        record.freeze();
        assert!(record.is_frozen());
        assert!(record.is_sealed());
        assert!(matches!(
            record.set("age", 1),
            Err(ValueError::NotWritable { .. })
        ));
        assert!(matches!(
            record.set("address", "x"),
            Err(ValueError::NotExtensible { .. })
        ));
        assert!(matches!(
            record.remove(&Key::from("name")),
            Err(ValueError::NotConfigurable { .. })
        ));
    }

    #[test]
    fn sealed_allows_reassignment() {
        let record = person();
        record.seal();
        record.set("age", 40).unwrap();
        assert!(!record.is_frozen());
        assert!(record.set("address", "x").is_err());
    }

    #[test]
    fn non_extensible_allows_removal() {
        let record = person();
        record.prevent_extensions();
        assert_eq!(record.remove(&Key::from("age")).unwrap(), Some(Value::from(30)));
        assert!(record.set("age", 1).is_err());
    }

    #[test]
    fn restriction_never_loosens() {
        let record = person();
        record.freeze();
        record.prevent_extensions();
        assert_eq!(record.restriction(), Restriction::Frozen);
    }

    #[test]
    fn set_flags_on_locked_entry_only_tightens() {
        let record = Container::record();
        record
            .define("a", 1, EntryFlags::new(true, false, true))
            .unwrap();
        assert!(record
            .set_flags(&Key::from("a"), EntryFlags::new(false, false, true))
            .unwrap());
        assert!(record
            .set_flags(&Key::from("a"), EntryFlags::RELAXED)
            .is_err());
        assert!(!record
            .set_flags(&Key::from("missing"), EntryFlags::RELAXED)
            .unwrap());
    }

    #[test]
    fn accessor_entries() {
        let store = Arc::new(AtomicI64::new(7));
        let read = Arc::clone(&store);
        let write = Arc::clone(&store);
        let record = Container::record();
        record
            .define_accessor(
                "computed",
                Accessor::getter(move || Value::from(read.load(Ordering::SeqCst)))
                    .with_setter(move |v| write.store(v.as_i64().unwrap_or(0), Ordering::SeqCst)),
                EntryFlags::RELAXED,
            )
            .unwrap();
        assert_eq!(record.get("computed"), Some(Value::from(7)));
        record.set("computed", 9).unwrap();
        assert_eq!(store.load(Ordering::SeqCst), 9);
        assert!(record.entry(&Key::from("computed")).unwrap().is_accessor());
    }

    #[test]
    fn push_pop_truncate() {
        let seq = Container::sequence();
        assert_eq!(seq.push(1).unwrap(), 0);
        assert_eq!(seq.push(2).unwrap(), 1);
        assert_eq!(seq.pop().unwrap(), Some(Value::from(2)));
        seq.push(3).unwrap();
        seq.truncate(1).unwrap();
        assert_eq!(seq.len(), 1);
        assert!(matches!(
            Container::record().push(1),
            Err(ValueError::WrongKind { .. })
        ));
    }

    #[test]
    fn new_like_keeps_kind_and_class() {
        let original = Container::with_class(ContainerKind::Sequence, "SubArray");
        original.push(1).unwrap();
        original.freeze();
        let fresh = original.new_like();
        assert_eq!(fresh.kind(), ContainerKind::Sequence);
        assert_eq!(fresh.class(), Some("SubArray"));
        assert!(fresh.is_empty());
        assert!(fresh.is_extensible());
        assert!(!fresh.ptr_eq(&original));
    }
}
