//! Shallow container duplication
//!
//! [`clone_value`] copies one container level. Nested containers are
//! shared by reference; each of them diverges through its own context.
//! In strict mode the copy starts fully relaxed and the source's
//! restrictions are captured as [`RestoreOp`]s, replayed at finalize.

use crate::config::CloneMode;
use crate::error::{EditError, EditResult};
use cow_value::{Container, ContainerKind, Entry, EntryFlags, Key, Restriction, Value, ValueError};

/// Whether a value can be duplicated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cloneability {
    /// Immutable scalar, passed through as-is
    Scalar,

    /// Plain record or sequence
    Container,

    /// Opaque built-in; carries the offending type name
    NotCloneable(String),
}

/// Classify a value for cloning
#[must_use]
pub fn classify(value: &Value) -> Cloneability {
    match value {
        Value::Container(_) => Cloneability::Container,
        Value::Opaque(opaque) => Cloneability::NotCloneable(opaque.type_name().to_string()),
        _ => Cloneability::Scalar,
    }
}

/// Deferred reapplication of a restriction onto a copy
#[derive(Debug, Clone)]
pub enum RestoreOp {
    /// Put recorded entry flags back
    Flags {
        target: Container,
        entries: Vec<(Key, EntryFlags)>,
    },

    /// Reapply a whole-container restriction
    Restrict {
        target: Container,
        level: Restriction,
    },
}

impl RestoreOp {
    /// Container this op applies to
    #[must_use]
    pub fn target(&self) -> &Container {
        match self {
            Self::Flags { target, .. } | Self::Restrict { target, .. } => target,
        }
    }

    /// Replay the op; entries removed since cloning are skipped
    ///
    /// # Errors
    /// Fails if an entry was redefined as non-configurable in a way the
    /// recorded flags cannot tighten.
    pub fn apply(&self) -> Result<(), ValueError> {
        match self {
            Self::Flags { target, entries } => {
                for (key, flags) in entries {
                    target.set_flags(key, *flags)?;
                }
            }
            Self::Restrict { target, level } => target.restrict(*level),
        }
        Ok(())
    }
}

/// Result of cloning one value
#[derive(Debug, Clone)]
pub struct Cloned {
    /// The duplicate (the value itself for scalars)
    pub copy: Value,

    /// Ops to replay on `copy` at finalize, in registration order
    pub restores: Vec<RestoreOp>,
}

impl Cloned {
    fn passthrough(value: &Value) -> Self {
        Self {
            copy: value.clone(),
            restores: Vec::new(),
        }
    }
}

/// Shallow-clone `value`
///
/// # Errors
/// [`EditError::NotCloneable`] for opaque values.
pub fn clone_value(value: &Value, mode: CloneMode) -> EditResult<Cloned> {
    match value {
        Value::Container(source) => match mode {
            CloneMode::Strict => clone_strict(source),
            CloneMode::Loose => clone_loose(source),
        },
        Value::Opaque(opaque) => Err(EditError::not_cloneable(opaque.type_name())),
        _ => Ok(Cloned::passthrough(value)),
    }
}

fn clone_strict(source: &Container) -> EditResult<Cloned> {
    let copy = source.new_like();
    let mut changed = Vec::new();

    for (key, entry) in source.entries() {
        if entry.flags.is_restrictive() {
            changed.push((key.clone(), entry.flags));
        }
        copy.define_entry(
            key,
            Entry {
                slot: entry.slot,
                flags: entry.flags.relaxed(),
            },
        )?;
    }

    // replayed last-first: flags go back on before the container is locked
    let mut restores = Vec::new();
    let level = source.restriction();
    if level != Restriction::Extensible {
        restores.push(RestoreOp::Restrict {
            target: copy.clone(),
            level,
        });
    }
    if !changed.is_empty() {
        restores.push(RestoreOp::Flags {
            target: copy.clone(),
            entries: changed,
        });
    }

    tracing::trace!(
        type_name = source.type_name(),
        entries = copy.len(),
        restores = restores.len(),
        "cloned container"
    );

    Ok(Cloned {
        copy: Value::Container(copy),
        restores,
    })
}

fn clone_loose(source: &Container) -> EditResult<Cloned> {
    let copy = match source.kind() {
        ContainerKind::Record => Container::record(),
        ContainerKind::Sequence => Container::sequence(),
    };

    for (key, entry) in source.entries() {
        let keep = match (source.kind(), &key) {
            (ContainerKind::Sequence, Key::Index(_)) => true,
            (ContainerKind::Sequence, Key::Name(_)) => false,
            (ContainerKind::Record, _) => entry.flags.enumerable,
        };
        if keep {
            copy.set(key, entry.resolve())?;
        }
    }

    tracing::trace!(type_name = source.type_name(), entries = copy.len(), "cloned container (loose)");

    Ok(Cloned {
        copy: Value::Container(copy),
        restores: Vec::new(),
    })
}
