use cow_value::{Container, EntryFlags, Key, Restriction, Value, ValueError};
use proptest::prelude::*;

fn arb_restriction() -> impl Strategy<Value = Restriction> {
    prop_oneof![
        Just(Restriction::Extensible),
        Just(Restriction::NonExtensible),
        Just(Restriction::Sealed),
        Just(Restriction::Frozen),
    ]
}

#[test]
fn test_frozen_rejects_writes_and_new_keys() {
    let record = Container::record_from([("year", 2100)]);
    record.freeze();

    assert_eq!(
        record.set("year", 1988),
        Err(ValueError::NotWritable {
            key: Key::from("year")
        })
    );
    assert!(matches!(
        record.set("month", 4),
        Err(ValueError::NotExtensible { .. })
    ));
    assert_eq!(record.get("year"), Some(Value::from(2100)));
}

#[test]
fn test_sealed_allows_writes_only() {
    let record = Container::record_from([("name", "")]);
    record.seal();

    record.set("name", "Alice").unwrap();
    assert!(record.set("address", "abc").is_err());
    assert!(record.remove(&Key::from("name")).is_err());
    assert_eq!(record.get("name"), Some(Value::from("Alice")));
}

proptest! {
    #[test]
    fn prop_restriction_never_loosens(first in arb_restriction(), second in arb_restriction()) {
        let record = Container::record_from([("a", 1)]);
        record.restrict(first);
        record.restrict(second);
        prop_assert_eq!(record.restriction(), first.max(second));
    }

    #[test]
    fn prop_new_keys_follow_restriction(level in arb_restriction(), key in "[a-z]{1,8}") {
        let record = Container::record();
        record.restrict(level);
        let inserted = record.set(key.as_str(), 1).is_ok();
        prop_assert_eq!(inserted, level.allows_new_keys());
    }

    #[test]
    fn prop_locked_entries_only_tighten(
        writable in any::<bool>(),
        enumerable in any::<bool>(),
    ) {
        let record = Container::record();
        record.define("a", 1, EntryFlags::new(false, false, true)).unwrap();
        let requested = EntryFlags::new(writable, false, enumerable);
        let result = record.set_flags(&Key::from("a"), requested);
        if writable || !enumerable {
            prop_assert!(result.is_err());
        } else {
            prop_assert!(result.is_ok());
        }
    }
}
