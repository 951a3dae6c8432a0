use cow_context::prelude::*;
use cow_test_utils::{alice, arb_shape, frozen_record, frozen_sequence, people};
use proptest::prelude::*;

fn container(value: &Value) -> &Container {
    value.as_container().expect("container value")
}

#[test]
fn test_locked_birth_scenario() {
    let birth = frozen_record([("year", 2100)]);
    let source = frozen_record([("name", Value::from("Alice")), ("birth", Value::from(&birth))]);

    let ctx = mutate(&source).unwrap();
    ctx.set(["birth", "year"], 1988).unwrap();
    let result = ctx.finalize().unwrap();

    assert!(!result.same(&Value::from(&source)));
    let result_birth = result.get("birth").unwrap();
    assert!(!result_birth.same(&Value::from(&birth)));
    assert_eq!(result_birth.get("year"), Some(Value::from(1988)));
    assert!(container(&result_birth).is_frozen());
    assert!(container(&result).is_frozen());
    assert_eq!(result.get("name"), source.get("name"));
    assert_eq!(birth.get("year"), Some(Value::from(2100)));
}

#[test]
fn test_shared_value_scenario() {
    let shared = frozen_record([("foo", "")]);
    let source = frozen_record([("prop1", &shared), ("prop2", &shared)]);

    let ctx = mutate(&source).unwrap();
    ctx.set(["prop1", "foo"], "abc").unwrap();
    ctx.set(["prop2", "foo"], "123").unwrap();
    // root, plus one copy of `shared` per path that reaches it
    assert_eq!(ctx.stats().clones, 3);

    let result = ctx.finalize().unwrap();
    let prop1 = result.get("prop1").unwrap();
    let prop2 = result.get("prop2").unwrap();
    assert!(!prop1.same(&prop2));
    assert_eq!(prop1.get("foo"), Some(Value::from("abc")));
    assert_eq!(prop2.get("foo"), Some(Value::from("123")));
    assert_eq!(shared.get("foo"), Some(Value::from("")));
}

#[test]
fn test_nested_sessions_over_shared_value() {
    let shared = frozen_record([("foo", frozen_sequence([1]))]);
    let object_a = frozen_record([("foo", &shared)]);
    let object_b = frozen_record([("foo", &shared)]);
    let target = path!["foo", "foo", 0];

    let mut object_b_copy = None;
    let object_a_copy = apply_update(&object_a, |copy_a| {
        let copy = apply_update(&object_b, |copy_b| {
            copy_a.set(&target, 2)?;
            copy_b.set(&target, 3)?;
            assert_eq!(copy_a.get(&target)?.read()?, Value::from(2));
            assert_eq!(copy_b.get(&target)?.read()?, Value::from(3));
            Ok(())
        })?;
        assert_eq!(copy_a.get(&target)?.read()?, Value::from(2));
        object_b_copy = Some(copy);
        Ok(())
    })
    .unwrap();
    let object_b_copy = object_b_copy.unwrap();

    assert_eq!(object_a_copy.lookup(&target), Some(Value::from(2)));
    assert_eq!(object_b_copy.lookup(&target), Some(Value::from(3)));
    assert!(!object_a_copy
        .lookup(["foo", "foo"])
        .unwrap()
        .same(&object_b_copy.lookup(["foo", "foo"]).unwrap()));
    assert_eq!(Value::from(&shared).lookup(path!["foo", 0]), Some(Value::from(1)));
    assert!(container(&object_a_copy.lookup(["foo", "foo"]).unwrap()).is_frozen());
}

#[test]
fn test_externally_frozen_replacement() {
    let source = frozen_record([("reference", Value::Null)]);
    let reference = frozen_record([("name", "")]);
    let copy = mutate(&source)
        .unwrap()
        .set("reference", &reference)
        .unwrap()
        .set(["reference", "name"], "hi")
        .unwrap()
        .finalize()
        .unwrap();
    assert_eq!(copy.lookup(["reference", "name"]), Some(Value::from("hi")));
    assert_eq!(reference.get("name"), Some(Value::from("")));
}

#[test]
fn test_minimal_cloning_leaves_siblings_shared() {
    let source = people();
    let copy = apply_update(&source, |ctx| {
        ctx.set(path![0, "birth_date", "year"], 1988)?;
        Ok(())
    })
    .unwrap();

    let original = Value::from(&source);
    for path in [path![], path![0], path![0, "birth_date"]] {
        assert!(!copy.lookup(&path).unwrap().same(&original.lookup(&path).unwrap()));
    }
    for path in [path![1], path![0, "name"], path![0, "death_date"]] {
        assert!(copy.lookup(&path).unwrap().same(&original.lookup(&path).unwrap()));
    }
}

#[test]
fn test_repeated_writes_clone_ancestors_once() {
    let ctx = mutate(alice()).unwrap();
    ctx.set(["birth_date", "year"], 1).unwrap();
    ctx.set(["birth_date", "month"], 2).unwrap();
    ctx.set(["birth_date", "day"], 3).unwrap();
    assert_eq!(ctx.stats().clones, 2);

    ctx.set(["death_date", "year"], 4).unwrap();
    assert_eq!(ctx.stats().clones, 3);
}

#[test]
fn test_revoked_session_rejects_everything() {
    let ctx = mutate(alice()).unwrap();
    let year = ctx.get(["birth_date", "year"]).unwrap();
    ctx.revoke();

    for context in [&ctx, &year] {
        assert!(context.is_revoked());
        assert_eq!(context.read().unwrap_err(), EditError::Revoked);
        assert_eq!(context.write().unwrap_err(), EditError::Revoked);
        assert_eq!(context.get("x").unwrap_err(), EditError::Revoked);
        assert_eq!(context.set("x", 1).unwrap_err(), EditError::Revoked);
        assert_eq!(context.replace(1).unwrap_err(), EditError::Revoked);
        assert_eq!(context.parent().unwrap_err(), EditError::Revoked);
        assert_eq!(context.root().unwrap_err(), EditError::Revoked);
        assert_eq!(context.finalize().unwrap_err(), EditError::Revoked);
        assert_eq!(
            context.dangerously_set_as_mutable().unwrap_err(),
            EditError::Revoked
        );
        context.revoke();
    }
}

#[test]
fn test_restore_equal_after_noop_rewrite() {
    let source = alice();
    let copy = apply_update(&source, |ctx| {
        ctx.set(["birth_date", "year"], 1988)?;
        ctx.set(["birth_date", "year"], 2100)?;
        Ok(())
    })
    .unwrap();
    let original = Value::from(&source);
    assert!(!copy.same(&original));

    let restored = restore_equal(&original, &copy).unwrap();
    assert!(restored.same(&original));
}

proptest! {
    #[test]
    fn prop_update_without_writes_returns_source(shape in arb_shape()) {
        let source = shape.build();
        let result = apply_update(&source, |ctx| {
            ctx.read()?;
            if let Some(record) = ctx.read()?.as_container() {
                for key in record.keys() {
                    ctx.get(key)?.read()?;
                }
            }
            Ok(())
        })
        .unwrap();
        prop_assert!(result.same(&source));
    }

    #[test]
    fn prop_noop_set_never_diverges(shape in arb_shape()) {
        let source = shape.build();
        let ctx = mutate(&source).unwrap();
        if let Some(container) = source.as_container() {
            for key in container.keys() {
                let current = ctx.get(key.clone()).unwrap().read().unwrap();
                ctx.set(key, current).unwrap();
            }
        }
        prop_assert_eq!(ctx.status(), ContextStatus::None);
        prop_assert_eq!(ctx.stats().clones, 0);
    }

    #[test]
    fn prop_single_write_clones_only_its_path(
        shape in arb_shape(),
        pick in any::<prop::sample::Index>(),
    ) {
        let source = shape.build();
        let Some(container) = source.as_container() else {
            return Ok(());
        };
        let keys = container.keys();
        prop_assume!(!keys.is_empty());
        let target = keys[pick.index(keys.len())].clone();

        let result = apply_update(&source, |ctx| {
            ctx.set(target.clone(), "changed")?;
            Ok(())
        })
        .unwrap();

        prop_assert!(!result.same(&source));
        prop_assert_eq!(result.get(target.clone()), Some(Value::from("changed")));
        for key in keys.into_iter().filter(|key| *key != target) {
            prop_assert!(result.get(key.clone()).unwrap().same(&source.get(key).unwrap()));
        }
        prop_assert!(result.as_container().unwrap().is_frozen());
    }

    #[test]
    fn prop_existing_child_sees_overwrite(shape in arb_shape(), replacement in arb_shape()) {
        let source = frozen_record([("slot", shape.build())]);
        let ctx = mutate(&source).unwrap();
        let child = ctx.get("slot").unwrap();
        child.read().unwrap();

        let new_value = replacement.build();
        ctx.set("slot", &new_value).unwrap();
        prop_assert!(child.read().unwrap().same(&new_value));
    }
}
