//! Document values and typed conversion

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Document, ObjectId};

/// A single value stored inside a [`Document`]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent / explicit null
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    ObjectId(ObjectId),
    List(Vec<Value>),
    Document(Document),
}

/// The runtime kind of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Timestamp,
    ObjectId,
    List,
    Document,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Timestamp => "timestamp",
            ValueKind::ObjectId => "object id",
            ValueKind::List => "list",
            ValueKind::Document => "document",
        };
        f.write_str(name)
    }
}

/// A value did not have the kind the caller asked for
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Expected {expected}, found {found}")]
pub struct ValueError {
    pub expected: ValueKind,
    pub found: ValueKind,
}

impl Value {
    /// Runtime kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::ObjectId(_) => ValueKind::ObjectId,
            Value::List(_) => ValueKind::List,
            Value::Document(_) => ValueKind::Document,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }
}

// ============================================================================
// Rust -> Value
// ============================================================================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Value::ObjectId(v)
    }
}

/// Player identifiers are stored in their hyphenated text form
impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Value::Document(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

// ============================================================================
// Value -> Rust
// ============================================================================

/// Typed extraction from a [`Value`].
///
/// Extraction is strict: an `Int` is not silently widened into a `Float` or
/// parsed out of a `String`.
pub trait FromValue: Sized {
    /// The kind this type is read from
    const KIND: ValueKind;

    fn from_value(value: &Value) -> Option<Self>;

    /// Like [`FromValue::from_value`], reporting the mismatch
    fn try_from_value(value: &Value) -> Result<Self, ValueError> {
        Self::from_value(value).ok_or(ValueError {
            expected: Self::KIND,
            found: value.kind(),
        })
    }
}

macro_rules! impl_from_value {
    ($ty:ty, $kind:ident, $pat:pat => $out:expr) => {
        impl FromValue for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    $pat => Some($out),
                    _ => None,
                }
            }
        }
    };
}

impl_from_value!(bool, Bool, Value::Bool(v) => *v);
impl_from_value!(i64, Int, Value::Int(v) => *v);
impl_from_value!(f64, Float, Value::Float(v) => *v);
impl_from_value!(String, String, Value::String(v) => v.clone());
impl_from_value!(DateTime<Utc>, Timestamp, Value::Timestamp(v) => *v);
impl_from_value!(ObjectId, ObjectId, Value::ObjectId(v) => *v);
impl_from_value!(Document, Document, Value::Document(v) => v.clone());
impl_from_value!(Vec<Value>, List, Value::List(v) => v.clone());

impl FromValue for i32 {
    const KIND: ValueKind = ValueKind::Int;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FromValue for Uuid {
    const KIND: ValueKind = ValueKind::String;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().and_then(|s| Uuid::parse_str(s).ok())
    }
}

impl FromValue for Value {
    const KIND: ValueKind = ValueKind::Null;

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}
