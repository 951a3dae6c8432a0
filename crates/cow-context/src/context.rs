//! Lazy copy-on-write context tree
//!
//! One [`EditContext`] exists per path navigated from the root. Contexts
//! read through to their source until something beneath them is written;
//! the first write clones exactly the chain of not-yet-diverged ancestors,
//! outermost first, and links each clone into its parent's clone. Sibling
//! subtrees stay shared with the source.
//!
//! All contexts of a session live in one arena owned by the root; a
//! context handle is the arena plus a node index.
//!
//! # State machine
//!
//! ```text
//!   None ──write──▶ Diverged
//!    ▲  ╲              │
//!    │   ╲ invalidate  │ invalidate (parent overwrote our key)
//!  read   ▼            ▼
//!    └──── Stale ◀─────┘
//!
//!   any ──finalize / revoke──▶ Revoked (terminal)
//! ```

use crate::clone::{clone_value, Cloned, RestoreOp};
use crate::config::EditOptions;
use crate::error::{EditError, EditResult};
use cow_value::{IntoPath, Key, Path, Slot as EntrySlot, Value};
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

/// Index of a context inside its session's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeId(usize);

/// Observable lifecycle state of a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextStatus {
    /// Reading through to the source
    None,

    /// Owns a clone that is the authoritative value
    Diverged,

    /// Cached source is outdated; re-read from the parent on next access
    Stale,

    /// Finalized or revoked
    Revoked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    None,
    Diverged,
    Stale,
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    key: Option<Key>,
    /// `None` exactly while stale
    source: Option<Value>,
    result: Option<Value>,
    status: Status,
    children: IndexMap<Key, NodeId>,
    restores: Vec<RestoreOp>,
}

impl Node {
    fn new(source: Value, parent: Option<NodeId>, key: Option<Key>) -> Self {
        Self {
            parent,
            key,
            source: Some(source),
            result: None,
            status: Status::None,
            children: IndexMap::new(),
            restores: Vec::new(),
        }
    }

    fn link(&self) -> Option<(NodeId, Key)> {
        self.parent.zip(self.key.clone())
    }

    fn invalidate(&mut self) {
        self.source = None;
        self.result = None;
        self.restores.clear();
        self.status = Status::Stale;
    }
}

#[derive(Debug)]
enum Slot {
    Live(Node),
    Revoked,
}

/// Counters for one edit session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditStats {
    /// Containers duplicated so far
    pub clones: usize,

    /// Contexts allocated so far (including revoked ones)
    pub contexts: usize,
}

#[derive(Debug)]
struct Tree {
    slots: Vec<Slot>,
    options: EditOptions,
    clones: usize,
}

impl Tree {
    fn node(&self, id: NodeId) -> EditResult<&Node> {
        match &self.slots[id.0] {
            Slot::Live(node) => Ok(node),
            Slot::Revoked => Err(EditError::Revoked),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> EditResult<&mut Node> {
        match &mut self.slots[id.0] {
            Slot::Live(node) => Ok(node),
            Slot::Revoked => Err(EditError::Revoked),
        }
    }

    fn is_live(&self, id: NodeId) -> bool {
        matches!(self.slots[id.0], Slot::Live(_))
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot::Live(node));
        id
    }

    fn status(&self, id: NodeId) -> ContextStatus {
        match &self.slots[id.0] {
            Slot::Revoked => ContextStatus::Revoked,
            Slot::Live(node) => match node.status {
                Status::None => ContextStatus::None,
                Status::Diverged => ContextStatus::Diverged,
                Status::Stale => ContextStatus::Stale,
            },
        }
    }

    /// Source value, re-derived from the parent if stale
    fn source(&mut self, id: NodeId) -> EditResult<Value> {
        let node = self.node(id)?;
        if let Some(source) = &node.source {
            return Ok(source.clone());
        }

        let value = match node.link() {
            Some((parent, key)) => self.prop_value(parent, &key)?,
            // only children are ever invalidated
            None => Value::Null,
        };

        let node = self.node_mut(id)?;
        node.source = Some(value.clone());
        if node.status == Status::Stale {
            node.status = Status::None;
        }
        Ok(value)
    }

    fn read(&mut self, id: NodeId) -> EditResult<Value> {
        let node = self.node(id)?;
        if node.status == Status::Diverged {
            if let Some(result) = &node.result {
                return Ok(result.clone());
            }
        }
        self.source(id)
    }

    /// Current entry of this node's value at `key` (`Null` when absent)
    fn prop_value(&mut self, id: NodeId, key: &Key) -> EditResult<Value> {
        match self.read(id)? {
            Value::Container(container) => match container.entry(key).map(|entry| entry.slot) {
                Some(EntrySlot::Data(value)) => Ok(value),
                Some(EntrySlot::Accessor(_)) => {
                    Err(EditError::UnsupportedAccessor { key: key.clone() })
                }
                None => Ok(Value::Null),
            },
            Value::Opaque(_) => Ok(Value::Null),
            scalar => Err(EditError::not_a_container(key.clone(), scalar.type_name())),
        }
    }

    /// True if this node's value already holds `value` at `key`
    fn holds(&mut self, id: NodeId, key: &Key, value: &Value) -> EditResult<bool> {
        match self.read(id)? {
            Value::Container(container) => match container.entry(key).map(|entry| entry.slot) {
                Some(EntrySlot::Data(current)) => Ok(current.same(value)),
                Some(EntrySlot::Accessor(_)) => {
                    Err(EditError::UnsupportedAccessor { key: key.clone() })
                }
                None => Ok(false),
            },
            Value::Opaque(_) => Ok(false),
            scalar => Err(EditError::not_a_container(key.clone(), scalar.type_name())),
        }
    }

    /// Memoized child for `key`
    fn child(&mut self, id: NodeId, key: &Key) -> EditResult<NodeId> {
        let value = self.prop_value(id, key)?;
        if let Some(&child) = self.node(id)?.children.get(key) {
            return Ok(child);
        }
        let child = self.alloc(Node::new(value, Some(id), Some(key.clone())));
        self.node_mut(id)?.children.insert(key.clone(), child);
        Ok(child)
    }

    fn descend(&mut self, id: NodeId, path: &Path) -> EditResult<NodeId> {
        self.node(id)?;
        path.iter().try_fold(id, |current, key| self.child(current, key))
    }

    /// Diverge `id` and every non-diverged ancestor
    fn copy_for_write(&mut self, id: NodeId) -> EditResult<()> {
        match &self.slots[id.0] {
            Slot::Revoked => return Ok(()),
            Slot::Live(node) if node.status == Status::Diverged => return Ok(()),
            Slot::Live(_) => {}
        }

        let mut chain: SmallVec<[NodeId; 8]> = SmallVec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current)?;
            if node.status == Status::Diverged {
                break;
            }
            chain.push(current);
            cursor = node.parent;
        }

        // every clone is made before any is linked
        let mode = self.options.clone_mode;
        let mut clones: SmallVec<[(NodeId, Cloned); 8]> = SmallVec::with_capacity(chain.len());
        for &current in chain.iter().rev() {
            let source = self.source(current)?;
            clones.push((current, clone_value(&source, mode)?));
        }

        for (current, cloned) in clones {
            if cloned.copy.is_container() {
                self.clones += 1;
            }
            let node = self.node_mut(current)?;
            node.result = Some(cloned.copy.clone());
            node.restores = cloned.restores;
            node.status = Status::Diverged;
            if let Some((parent, key)) = node.link() {
                self.store(parent, key, cloned.copy)?;
            }
        }

        tracing::trace!(depth = chain.len(), clones = self.clones, "diverged context chain");
        Ok(())
    }

    /// Raw assignment into a diverged node's result
    fn store(&mut self, id: NodeId, key: Key, value: Value) -> EditResult<()> {
        match self.read(id)? {
            Value::Container(container) => Ok(container.set(key, value)?),
            other => Err(EditError::not_a_container(key, other.type_name())),
        }
    }

    /// Structural edit: diverge, assign, invalidate the child for `key`
    fn assign(&mut self, id: NodeId, key: Key, value: Value) -> EditResult<()> {
        self.copy_for_write(id)?;
        self.store(id, key.clone(), value)?;
        if let Some(child) = self.node(id)?.children.get(&key).copied() {
            self.invalidate(child);
        }
        Ok(())
    }

    fn set_if_changed(&mut self, id: NodeId, key: Key, value: Value) -> EditResult<()> {
        if self.holds(id, &key, &value)? {
            return Ok(());
        }
        self.assign(id, key, value)
    }

    /// Mark `id` and its whole subtree stale
    fn invalidate(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Slot::Live(node) = &mut self.slots[current.0] {
                node.invalidate();
                pending.extend(node.children.values().copied());
            }
        }
        tracing::trace!(node = id.0, "invalidated context subtree");
    }

    fn invalidate_children(&mut self, id: NodeId) -> EditResult<()> {
        let children: SmallVec<[NodeId; 8]> = self.node(id)?.children.values().copied().collect();
        for child in children {
            self.invalidate(child);
        }
        Ok(())
    }

    fn replace(&mut self, id: NodeId, value: Value) -> EditResult<()> {
        match self.node(id)?.link() {
            Some((parent, key)) => self.set_if_changed(parent, key, value),
            None => {
                let node = self.node_mut(id)?;
                node.source = Some(value);
                node.result = None;
                node.restores.clear();
                node.status = Status::None;
                self.invalidate_children(id)
            }
        }
    }

    fn adopt(&mut self, id: NodeId) -> EditResult<()> {
        let source = self.source(id)?;
        // may be the source itself
        let current = self.read(id)?;
        if let Some((parent, key)) = self.node(id)?.link() {
            self.assign(parent, key, current.clone())?;
        }
        let node = self.node_mut(id)?;
        node.source = Some(source);
        node.result = Some(current);
        node.restores.clear();
        node.status = Status::Diverged;
        self.invalidate_children(id)
    }

    fn root(&self, id: NodeId) -> EditResult<NodeId> {
        let mut current = id;
        while let Some(parent) = self.node(current)?.parent {
            current = parent;
        }
        Ok(current)
    }

    fn revoke(&mut self, id: NodeId) {
        let Slot::Live(node) = std::mem::replace(&mut self.slots[id.0], Slot::Revoked) else {
            return;
        };
        tracing::trace!(node = id.0, "revoked context");
        if let Some((parent, key)) = node.link() {
            if let Slot::Live(parent) = &mut self.slots[parent.0] {
                if parent.children.get(&key) == Some(&id) {
                    parent.children.shift_remove(&key);
                }
            }
        }
        for child in node.children.into_values() {
            self.revoke(child);
        }
    }

    fn finalize(&mut self, id: NodeId) -> EditResult<Value> {
        let children: SmallVec<[NodeId; 8]> = self.node(id)?.children.values().copied().collect();
        for child in children {
            if self.is_live(child) {
                self.finalize(child)?;
            }
        }

        let value = self.read(id)?;
        let node = self.node_mut(id)?;
        let restores = std::mem::take(&mut node.restores);
        let is_root = node.parent.is_none();
        self.revoke(id);

        for op in restores.iter().rev() {
            op.apply()?;
        }

        if is_root {
            tracing::debug!(
                clones = self.clones,
                contexts = self.slots.len(),
                "finalized edit session"
            );
        }
        Ok(value)
    }
}

/// Handle to one context of an edit session
///
/// Handles are cheap to clone. Two handles compare equal when they refer
/// to the same context of the same session; navigating the same path twice
/// yields equal handles.
#[derive(Clone)]
pub struct EditContext {
    tree: Rc<RefCell<Tree>>,
    id: NodeId,
}

impl EditContext {
    pub(crate) fn new_root(source: Value, options: EditOptions) -> Self {
        let mut tree = Tree {
            slots: Vec::new(),
            options,
            clones: 0,
        };
        let id = tree.alloc(Node::new(source, None, None));
        Self {
            tree: Rc::new(RefCell::new(tree)),
            id,
        }
    }

    fn handle(&self, id: NodeId) -> Self {
        Self {
            tree: Rc::clone(&self.tree),
            id,
        }
    }

    fn with_tree<T>(&self, f: impl FnOnce(&mut Tree) -> T) -> T {
        f(&mut self.tree.borrow_mut())
    }

    /// Current value: the clone if diverged, otherwise the source
    ///
    /// # Errors
    /// [`EditError::Revoked`] once finalized or revoked.
    pub fn read(&self) -> EditResult<Value> {
        self.with_tree(|tree| tree.read(self.id))
    }

    /// Force divergence and return the owned clone for direct edits
    ///
    /// Calling it again returns the same clone.
    ///
    /// # Errors
    /// [`EditError::Revoked`], or [`EditError::NotCloneable`] if the value
    /// or an ancestor cannot be duplicated.
    pub fn write(&self) -> EditResult<Value> {
        self.with_tree(|tree| {
            tree.node(self.id)?;
            tree.copy_for_write(self.id)?;
            tree.read(self.id)
        })
    }

    /// Context at `path` below this one (this context for an empty path)
    ///
    /// # Errors
    /// [`EditError::Revoked`], [`EditError::NotAContainer`] when a segment
    /// crosses a scalar, [`EditError::UnsupportedAccessor`] when it crosses a
    /// computed entry.
    pub fn get(&self, path: impl IntoPath) -> EditResult<Self> {
        let path = path.into_path();
        let id = self.with_tree(|tree| tree.descend(self.id, &path))?;
        Ok(self.handle(id))
    }

    /// Assign `value` at `path`, or replace this context's value for an
    /// empty path
    ///
    /// Assigning the value already present is a no-op and clones nothing.
    ///
    /// # Errors
    /// Same conditions as [`get`](Self::get) and [`write`](Self::write).
    pub fn set(&self, path: impl IntoPath, value: impl Into<Value>) -> EditResult<&Self> {
        let path = path.into_path();
        let value = value.into();
        self.with_tree(|tree| match path.split_last() {
            None => {
                tree.node(self.id)?;
                tree.replace(self.id, value)
            }
            Some((key, parent_path)) => {
                let target = tree.descend(self.id, &parent_path)?;
                tree.set_if_changed(target, key.clone(), value)
            }
        })?;
        Ok(self)
    }

    /// Replace this context's value outright
    ///
    /// On the root this resets divergence and invalidates every descendant
    /// context. On a child it is an assignment at this context's key in the
    /// parent.
    ///
    /// # Errors
    /// [`EditError::Revoked`], or any error of the parent's assignment.
    pub fn replace(&self, value: impl Into<Value>) -> EditResult<&Self> {
        let value = value.into();
        self.with_tree(|tree| {
            tree.node(self.id)?;
            tree.replace(self.id, value)
        })?;
        Ok(self)
    }

    /// Run `updater` on the context at `path`
    ///
    /// # Errors
    /// Navigation errors, or whatever `updater` returns.
    pub fn update<F>(&self, path: impl IntoPath, updater: F) -> EditResult<&Self>
    where
        F: FnOnce(&Self) -> EditResult<()>,
    {
        let context = self.get(path)?;
        updater(&context)?;
        Ok(self)
    }

    /// Adopt the current value as this context's own clone without copying
    ///
    /// Later writes through this context mutate that value in place. If
    /// anything else still holds the value (including the source tree),
    /// it observes those writes.
    ///
    /// # Errors
    /// [`EditError::Revoked`], or any error of the parent's assignment.
    pub fn dangerously_set_as_mutable(&self) -> EditResult<()> {
        self.with_tree(|tree| tree.adopt(self.id))
    }

    /// Parent context (`None` for the root)
    ///
    /// # Errors
    /// [`EditError::Revoked`].
    pub fn parent(&self) -> EditResult<Option<Self>> {
        let parent = self.with_tree(|tree| tree.node(self.id).map(|node| node.parent))?;
        Ok(parent.map(|id| self.handle(id)))
    }

    /// Root context of this session
    ///
    /// # Errors
    /// [`EditError::Revoked`].
    pub fn root(&self) -> EditResult<Self> {
        let root = self.with_tree(|tree| tree.root(self.id))?;
        Ok(self.handle(root))
    }

    /// Key connecting this context to its parent (`None` for the root)
    ///
    /// # Errors
    /// [`EditError::Revoked`].
    pub fn key(&self) -> EditResult<Option<Key>> {
        self.with_tree(|tree| tree.node(self.id).map(|node| node.key.clone()))
    }

    /// Revoke this context and every descendant; idempotent
    pub fn revoke(&self) {
        self.with_tree(|tree| tree.revoke(self.id));
    }

    /// True once finalized or revoked
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        !self.tree.borrow().is_live(self.id)
    }

    /// Lifecycle state
    #[must_use]
    pub fn status(&self) -> ContextStatus {
        self.tree.borrow().status(self.id)
    }

    /// Finalize descendants, then this context; returns its value
    ///
    /// Recorded restrictions are reapplied to this context's clone, and the
    /// context and its descendants are revoked.
    ///
    /// # Errors
    /// [`EditError::Revoked`], or a restore failure.
    pub fn finalize(&self) -> EditResult<Value> {
        self.with_tree(|tree| tree.finalize(self.id))
    }

    /// Finalize the whole session from any of its contexts
    ///
    /// # Errors
    /// Same conditions as [`finalize`](Self::finalize).
    pub fn finalize_root(&self) -> EditResult<Value> {
        self.with_tree(|tree| {
            let root = tree.root(self.id)?;
            tree.finalize(root)
        })
    }

    /// Session counters
    #[must_use]
    pub fn stats(&self) -> EditStats {
        let tree = self.tree.borrow();
        EditStats {
            clones: tree.clones,
            contexts: tree.slots.len(),
        }
    }
}

impl PartialEq for EditContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree) && self.id == other.id
    }
}

impl Eq for EditContext {}

impl Debug for EditContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditContext")
            .field("node", &self.id.0)
            .field("status", &self.status())
            .finish()
    }
}
