//! Structural re-sharing after an edit
//!
//! An edit that ends up writing back equal values still produces fresh
//! containers. [`restore_equal`] walks the original and the edited value
//! together and substitutes original subtrees wherever they are
//! structurally equal, so identity checks downstream stay cheap.

use cow_value::{Container, Value, ValueError};
use std::collections::HashSet;

/// Return `copy` with every structurally-equal subtree replaced by the
/// corresponding subtree of `original`
///
/// If the whole value is equal, `original` itself is returned. Entries of
/// `copy` are only rewritten where they are writable data entries.
///
/// # Errors
/// Propagates a rejected write into `copy`.
pub fn restore_equal(original: &Value, copy: &Value) -> Result<Value, ValueError> {
    let mut visited = HashSet::new();
    restore(original, copy, &mut visited)
}

fn restore(
    original: &Value,
    copy: &Value,
    visited: &mut HashSet<(usize, usize)>,
) -> Result<Value, ValueError> {
    if original.same(copy) {
        return Ok(original.clone());
    }
    let (Value::Container(orig), Value::Container(edited)) = (original, copy) else {
        return Ok(copy.clone());
    };
    if !comparable(orig, edited) {
        return Ok(copy.clone());
    }
    // a pair already on the stack is treated as unequal
    if !visited.insert((orig.addr(), edited.addr())) {
        return Ok(copy.clone());
    }

    let orig_entries = orig.entries();
    let mut equal = 0;
    for (key, entry) in &orig_entries {
        let Some(orig_value) = entry.value() else {
            continue;
        };
        let Some(edited_entry) = edited.entry(key) else {
            continue;
        };
        let Some(edited_value) = edited_entry.value() else {
            continue;
        };

        let restored = restore(orig_value, edited_value, visited)?;
        if !restored.same(edited_value) && edited_entry.flags.writable {
            edited.set(key.clone(), restored.clone())?;
        }
        if restored.same(orig_value) {
            equal += 1;
        }
    }

    // side properties of sequences count as entries on both sides
    if equal == orig_entries.len() && equal == edited.keys().len() {
        tracing::trace!(type_name = orig.type_name(), "re-shared equal subtree");
        Ok(original.clone())
    } else {
        Ok(copy.clone())
    }
}

fn comparable(a: &Container, b: &Container) -> bool {
    a.kind() == b.kind() && a.class() == b.class()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_tree_returns_original() {
        let original = Value::from(serde_json::json!({"a": {"b": [1, 2]}, "c": "x"}));
        let copy = Value::from(serde_json::json!({"a": {"b": [1, 2]}, "c": "x"}));
        let restored = restore_equal(&original, &copy).unwrap();
        assert!(restored.same(&original));
    }

    #[test]
    fn unchanged_subtrees_are_reshared() {
        let original = Value::from(serde_json::json!({"a": {"b": 1}, "c": {"d": 2}}));
        let copy = Value::from(serde_json::json!({"a": {"b": 1}, "c": {"d": 3}}));
        let restored = restore_equal(&original, &copy).unwrap();

        assert!(restored.same(&copy));
        assert!(restored.get("a").unwrap().same(&original.get("a").unwrap()));
        assert!(!restored.get("c").unwrap().same(&original.get("c").unwrap()));
    }

    #[test]
    fn extra_keys_are_not_equal() {
        let original = Value::from(serde_json::json!({"a": 1}));
        let copy = Value::from(serde_json::json!({"a": 1, "b": 2}));
        assert!(restore_equal(&original, &copy).unwrap().same(&copy));
    }

    #[test]
    fn sequence_with_extra_side_property_is_not_equal() {
        let original = Container::sequence_from([1]);
        let copy = Container::sequence_from([1]);
        copy.set("extra", 2).unwrap();

        let restored = restore_equal(&Value::from(&original), &Value::from(&copy)).unwrap();
        assert!(restored.same(&Value::from(&copy)));
        assert_eq!(restored.get("extra"), Some(Value::from(2)));
    }

    #[test]
    fn sequences_with_equal_side_properties_are_reshared() {
        let original = Container::sequence_from([1]);
        original.set("tag", "x").unwrap();
        let copy = Container::sequence_from([1]);
        copy.set("tag", "x").unwrap();

        let restored = restore_equal(&Value::from(&original), &Value::from(&copy)).unwrap();
        assert!(restored.same(&Value::from(&original)));
    }

    #[test]
    fn read_only_entries_are_left_alone() {
        let original = Value::from(serde_json::json!({"a": {"b": 1}, "c": 1}));
        let edited = Container::record_from([
            ("a", Value::from(serde_json::json!({"b": 1}))),
            ("c", Value::from(2)),
        ]);
        let inner = edited.get("a").unwrap();
        edited.freeze();

        let restored = restore_equal(&original, &Value::from(&edited)).unwrap();
        assert!(restored.get("a").unwrap().same(&inner));
    }

    #[test]
    fn cycles_terminate() {
        let original = Container::record();
        original.set("me", &original).unwrap();
        let copy = Container::record();
        copy.set("me", &copy).unwrap();

        let restored = restore_equal(&Value::from(&original), &Value::from(&copy)).unwrap();
        assert!(restored.same(&Value::from(&copy)));
    }
}
