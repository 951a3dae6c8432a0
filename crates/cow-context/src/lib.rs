//! Copy-on-write editing of nested values
//!
//! Edit a deeply nested, possibly frozen [`Value`](cow_value::Value) through
//! a tree of lazily created [`EditContext`]s. Only the containers on the
//! path to a write are duplicated; untouched subtrees stay shared with the
//! source, and entry flags and restriction levels of every duplicated
//! container are restored when the session is finalized.
//!
//! # Quick Start
//!
//! ```rust
//! use cow_context::prelude::*;
//!
//! let birth = Container::record_from([("year", 2100)]);
//! birth.freeze();
//! let alice = Container::record_from([
//!     ("name", Value::from("Alice")),
//!     ("birth", Value::from(&birth)),
//! ]);
//! alice.freeze();
//!
//! let edited = apply_update(&alice, |ctx| {
//!     ctx.set(["birth", "year"], 1988)?;
//!     Ok(())
//! })?;
//!
//! assert_eq!(edited.lookup(["birth", "year"]), Some(Value::from(1988)));
//! assert_eq!(birth.get("year"), Some(Value::from(2100)));
//! assert!(edited.as_container().is_some_and(Container::is_frozen));
//! # Ok::<(), EditError>(())
//! ```

mod clone;
mod config;
mod context;
mod error;
mod restore_equal;
mod session;

pub use clone::{classify, clone_value, Cloneability, Cloned, RestoreOp};
pub use config::{CloneMode, EditOptions, RootCheck};
pub use context::{ContextStatus, EditContext, EditStats};
pub use error::{EditError, EditResult};
pub use restore_equal::restore_equal;
pub use session::{apply_update, apply_update_with, mutate, mutate_with};

pub use cow_value;

/// Common imports for editing sessions
pub mod prelude {
    pub use crate::config::{CloneMode, EditOptions, RootCheck};
    pub use crate::context::{ContextStatus, EditContext};
    pub use crate::error::{EditError, EditResult};
    pub use crate::restore_equal::restore_equal;
    pub use crate::session::{apply_update, apply_update_with, mutate, mutate_with};
    pub use cow_value::{path, Container, ContainerKind, EntryFlags, Key, Path, Restriction, Value};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
