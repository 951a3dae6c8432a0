//! Testing utilities for COW workspace
//!
//! Shared fixtures, strategies, and log setup.

#![allow(missing_docs)]

use cow_value::{Container, ContainerKind, EntryFlags, Key, Path, Value};
use proptest::prelude::*;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::{EnvFilter, Registry};

/// Install a test subscriber honoring `RUST_LOG`; safe to call repeatedly
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Run `f` under a scoped subscriber and return the messages of every
/// event it emitted, at any level
pub fn capture_events<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = CaptureLayer {
        events: Arc::clone(&events),
    };
    let subscriber = Registry::default().with(layer);
    let output = tracing::dispatcher::with_default(&Dispatch::new(subscriber), f);
    let captured = events.lock().expect("event capture").clone();
    (output, captured)
}

struct CaptureLayer {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.events.lock().expect("event capture").push(visitor.message);
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

pub fn frozen_record<K, V, I>(entries: I) -> Container
where
    K: Into<Key>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    let record = Container::record_from(entries);
    record.freeze();
    record
}

pub fn frozen_sequence<V, I>(items: I) -> Container
where
    V: Into<Value>,
    I: IntoIterator<Item = V>,
{
    let sequence = Container::sequence_from(items);
    sequence.freeze();
    sequence
}

pub fn frozen_date(year: i32, month: i32, day: i32) -> Container {
    frozen_record([("year", year), ("month", month), ("day", day)])
}

/// Frozen person record: `name`, `birth_date`, `death_date`
pub fn alice() -> Container {
    person("Alice", frozen_date(2100, 4, 1), frozen_date(2330, 12, 24))
}

pub fn bob() -> Container {
    person("Bob", frozen_date(2101, 7, 14), frozen_date(2290, 2, 3))
}

pub fn person(name: &str, birth_date: Container, death_date: Container) -> Container {
    frozen_record([
        ("name", Value::from(name)),
        ("birth_date", Value::from(birth_date)),
        ("death_date", Value::from(death_date)),
    ])
}

/// Frozen sequence `[alice, bob]`
pub fn people() -> Container {
    frozen_sequence([alice(), bob()])
}

/// Record with a class tag and an entry of every flag combination
pub fn described() -> Container {
    let record = Container::with_class(ContainerKind::Record, "Described");
    for (i, flags) in all_flags().into_iter().enumerate() {
        record
            .define(format!("entry{i}"), Value::from(i as i64), flags)
            .expect("fresh record accepts definitions");
    }
    record
}

pub fn all_flags() -> Vec<EntryFlags> {
    let mut all = Vec::with_capacity(8);
    for writable in [false, true] {
        for configurable in [false, true] {
            for enumerable in [false, true] {
                all.push(EntryFlags::new(writable, configurable, enumerable));
            }
        }
    }
    all
}

/// `A..Z` chain of frozen records, each level also carrying `prop0..prop9`
pub fn alphabet_chain() -> Container {
    let mut current = frozen_record([("value", Value::from("leaf"))]);
    for letter in ('A'..='Z').rev() {
        let mut entries: Vec<(String, Value)> =
            (0..10).map(|i| (format!("prop{i}"), Value::from(i))).collect();
        entries.push((letter.to_string(), Value::from(current)));
        current = frozen_record(entries);
    }
    current
}

/// Path `A.B.…Z.value`
pub fn alphabet_path() -> Path {
    let mut path = Path::from_keys(('A'..='Z').map(|c| c.to_string()));
    path.push("value");
    path
}

/// Arbitrary JSON-like shape of bounded depth
pub fn arb_shape() -> impl Strategy<Value = shape::Shape> {
    shape::strategy()
}

pub mod shape {
    //! Plain tree description that builds into frozen containers

    use super::{Container, Value};
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    pub enum Shape {
        Int(i64),
        Str(String),
        Record(Vec<(String, Shape)>),
        Sequence(Vec<Shape>),
    }

    impl Shape {
        /// Build frozen containers from this description
        pub fn build(&self) -> Value {
            match self {
                Self::Int(i) => Value::from(*i),
                Self::Str(s) => Value::from(s.as_str()),
                Self::Record(entries) => {
                    let record =
                        Container::record_from(entries.iter().map(|(k, v)| (k.as_str(), v.build())));
                    record.freeze();
                    Value::from(record)
                }
                Self::Sequence(items) => {
                    let sequence = Container::sequence_from(items.iter().map(Shape::build));
                    sequence.freeze();
                    Value::from(sequence)
                }
            }
        }
    }

    pub(crate) fn strategy() -> impl Strategy<Value = Shape> {
        let leaf = prop_oneof![
            any::<i64>().prop_map(Shape::Int),
            "[a-z]{0,6}".prop_map(Shape::Str),
        ];
        leaf.prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(("[a-e]", inner.clone()), 0..4).prop_map(Shape::Record),
                prop::collection::vec(inner, 0..4).prop_map(Shape::Sequence),
            ]
        })
    }
}
