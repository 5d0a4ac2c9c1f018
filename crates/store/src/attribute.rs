//! Named attribute accessors
//!
//! Each record type carries one [`AttributeTable`], built once, mapping an
//! attribute name to its declared kind and a plain accessor function. Stores
//! use it to answer `find_one("name", value)` without runtime reflection.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use warden_document::{Document, ObjectId, Value, ValueKind};

/// A field type that can be exposed as a searchable attribute
pub trait AttributeType {
    /// Declared kind of the attribute
    const KIND: ValueKind;

    /// Current value of the attribute
    fn to_value(&self) -> Value;
}

macro_rules! impl_attribute_type {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl AttributeType for $ty {
                const KIND: ValueKind = ValueKind::$kind;

                fn to_value(&self) -> Value {
                    Value::from(self.clone())
                }
            }
        )*
    };
}

impl_attribute_type! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => Int,
    f64 => Float,
    String => String,
    DateTime<Utc> => Timestamp,
    ObjectId => ObjectId,
    Uuid => String,
    Document => Document,
}

/// Absent values read as `Null`; the declared kind is the inner kind
impl<T: AttributeType> AttributeType for Option<T> {
    const KIND: ValueKind = T::KIND;

    fn to_value(&self) -> Value {
        self.as_ref().map(T::to_value).unwrap_or(Value::Null)
    }
}

impl<T: AttributeType> AttributeType for Vec<T> {
    const KIND: ValueKind = ValueKind::List;

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(T::to_value).collect())
    }
}

/// One named accessor
pub struct Attribute<T> {
    name: &'static str,
    kind: ValueKind,
    get: fn(&T) -> Value,
}

impl<T> Attribute<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Read the attribute from a record
    pub fn read(&self, record: &T) -> Value {
        (self.get)(record)
    }

    /// Whether a query value may be compared against this attribute.
    ///
    /// Only values of the declared kind are accepted; `Null` never is.
    pub fn accepts(&self, value: &Value) -> bool {
        !value.is_null() && value.kind() == self.kind
    }

    /// Whether `record` holds exactly `value` under this attribute
    pub fn matches(&self, record: &T, value: &Value) -> bool {
        self.accepts(value) && self.read(record) == *value
    }
}

/// All searchable attributes of a record type
pub struct AttributeTable<T> {
    attributes: Vec<Attribute<T>>,
}

impl<T> AttributeTable<T> {
    pub fn new() -> Self {
        Self {
            attributes: Vec::new(),
        }
    }

    /// Add an accessor (builder style)
    pub fn with(mut self, name: &'static str, kind: ValueKind, get: fn(&T) -> Value) -> Self {
        self.attributes.push(Attribute { name, kind, get });
        self
    }

    /// Look up an accessor by name
    pub fn get(&self, name: &str) -> Option<&Attribute<T>> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.attributes.iter().map(|a| a.name)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl<T> Default for AttributeTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample {
        name: String,
        level: Option<i64>,
    }

    fn table() -> AttributeTable<Sample> {
        AttributeTable::new()
            .with("name", <String as AttributeType>::KIND, |s: &Sample| {
                s.name.to_value()
            })
            .with("level", <Option<i64> as AttributeType>::KIND, |s: &Sample| {
                s.level.to_value()
            })
    }

    #[test]
    fn test_lookup_by_name() {
        let table = table();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("level").map(|a| a.kind()), Some(ValueKind::Int));
        assert!(table.get("missing").is_none());
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["name", "level"]);
    }

    #[test]
    fn test_matches_requires_declared_kind() {
        let table = table();
        let sample = Sample {
            name: "7".into(),
            level: Some(7),
        };
        let level = table.get("level").unwrap();

        assert!(level.matches(&sample, &Value::Int(7)));
        assert!(!level.matches(&sample, &Value::from("7")));
        assert!(!level.matches(&sample, &Value::Float(7.0)));
    }

    #[test]
    fn test_null_never_matches() {
        let table = table();
        let sample = Sample {
            name: "x".into(),
            level: None,
        };
        let level = table.get("level").unwrap();
        assert_eq!(level.read(&sample), Value::Null);
        assert!(!level.matches(&sample, &Value::Null));
    }
}
