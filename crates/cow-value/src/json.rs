//! serde bridge
//!
//! Records serialize as maps of their enumerable entries, sequences as
//! arrays of their elements. Opaque values have no serialized form.
//! Serializing a cyclic value does not terminate.

use crate::container::{Container, ContainerKind};
use crate::key::Key;
use crate::value::Value;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Container(c) => c.serialize(serializer),
            Self::Opaque(o) => Err(S::Error::custom(format!(
                "{} values cannot be serialized",
                o.type_name()
            ))),
        }
    }
}

impl Serialize for Container {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.entries();
        match self.kind() {
            ContainerKind::Sequence => {
                let elements: Vec<_> = entries
                    .into_iter()
                    .filter(|(key, _)| matches!(key, Key::Index(_)))
                    .collect();
                let mut seq = serializer.serialize_seq(Some(elements.len()))?;
                for (_, entry) in elements {
                    seq.serialize_element(&entry.resolve())?;
                }
                seq.end()
            }
            ContainerKind::Record => {
                let visible: Vec<_> = entries
                    .into_iter()
                    .filter(|(_, entry)| entry.flags.enumerable)
                    .collect();
                let mut map = serializer.serialize_map(Some(visible.len()))?;
                for (key, entry) in visible {
                    map.serialize_entry(&key.to_string(), &entry.resolve())?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::from(s),
            serde_json::Value::Array(items) => {
                Self::Container(Container::sequence_from(items.into_iter().map(Self::from)))
            }
            serde_json::Value::Object(map) => Self::Container(Container::record_from(
                map.into_iter().map(|(k, v)| (k, Self::from(v))),
            )),
        }
    }
}

impl Value {
    /// Snapshot as a JSON value
    ///
    /// # Errors
    /// Fails if the tree contains an opaque value or a non-finite float.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::EntryFlags;
    use crate::opaque::{Opaque, OpaqueKind};
    use serde_json::json;

    #[test]
    fn json_round_trip_preserves_shape() {
        let source = json!({"name": "Alice", "dates": [2100, 2330], "ratio": 0.5});
        let value = Value::from(source.clone());
        assert_eq!(value.to_json().unwrap(), source);
    }

    #[test]
    fn hidden_entries_are_not_serialized() {
        let record = Container::record();
        record.define("shown", 1, EntryFlags::RELAXED).unwrap();
        record
            .define("hidden", 2, EntryFlags::RELAXED.with_enumerable(false))
            .unwrap();
        assert_eq!(Value::from(record).to_json().unwrap(), json!({"shown": 1}));
    }

    #[test]
    fn opaque_values_are_rejected() {
        let record = Container::record_from([("when", Opaque::new(OpaqueKind::Date, 0_i64))]);
        let err = Value::from(record).to_json().unwrap_err();
        assert!(err.to_string().contains("Date values cannot be serialized"));
    }

    #[test]
    fn deserialize_from_str() {
        let value: Value = serde_json::from_str(r#"{"year": 1988}"#).unwrap();
        assert_eq!(value.lookup(["year"]), Some(Value::from(1988)));
    }
}
