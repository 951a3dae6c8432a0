//! Value model for copy-on-write editing
//!
//! Arbitrarily nested containers whose entries carry attribute flags and
//! whose containers carry restriction levels, plus the keys and paths used
//! to navigate them.
//!
//! # Core Concepts
//!
//! - [`Value`]: scalar, [`Container`] handle, or [`Opaque`] built-in
//! - [`Container`]: shared keyed record or indexed sequence
//! - [`EntryFlags`] / [`Restriction`]: per-entry and whole-container mutability
//! - [`Key`] / [`Path`]: addressing within a tree
//!
//! # Example
//!
//! ```rust
//! use cow_value::{Container, Value};
//!
//! let birth = Container::record_from([("year", 2100)]);
//! birth.freeze();
//!
//! let alice = Container::record_from([
//!     ("name", Value::from("Alice")),
//!     ("birth", Value::from(&birth)),
//! ]);
//!
//! assert!(birth.set("year", 1988).is_err());
//! assert_eq!(Value::from(alice).lookup(["birth", "year"]), Some(Value::from(2100)));
//! ```

mod container;
mod error;
mod flags;
mod json;
mod key;
mod opaque;
mod path;
mod value;

pub use container::{
    Accessor, Container, ContainerKind, Entry, Getter, Setter, Slot, MAX_INDEX_GAP,
};
pub use error::ValueError;
pub use flags::{EntryFlags, Restriction};
pub use key::Key;
pub use opaque::{Opaque, OpaqueKind};
pub use path::{IntoPath, Path, PathError};
pub use value::Value;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
