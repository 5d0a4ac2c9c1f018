//! Record <-> document mapping
//!
//! Callers register one [`Serializer`] per record type. Hand-written
//! serializers use the field helpers below; [`SerdeSerializer`] covers any
//! serde type.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value as Json};
use warden_document::{Document, FromValue, Value, ID_KEY};

use crate::SerializationError;

/// Bidirectional mapping between a record and its document form.
///
/// Serializers never see the `_id` field: the store writes it before the
/// upsert and assigns it after deserialization.
pub trait Serializer<T>: Send + Sync {
    /// Convert a record into a document
    fn serialize(&self, record: &T) -> Result<Document, SerializationError>;

    /// Rebuild a record from a document
    fn deserialize(&self, document: &Document) -> Result<T, SerializationError>;
}

// ============================================================================
// Field helpers
// ============================================================================

/// Typed value that must be present
pub fn required<T: FromValue>(document: &Document, key: &str) -> Result<T, SerializationError> {
    optional(document, key)?.ok_or_else(|| SerializationError::MissingField(key.to_string()))
}

/// Typed value that may be absent or null
pub fn optional<T: FromValue>(
    document: &Document,
    key: &str,
) -> Result<Option<T>, SerializationError> {
    document
        .get_as(key)
        .map_err(|source| SerializationError::InvalidField {
            field: key.to_string(),
            source,
        })
}

/// List of typed values; absent reads as empty
pub fn list_of<T: FromValue>(document: &Document, key: &str) -> Result<Vec<T>, SerializationError> {
    let Some(items) = optional::<Vec<Value>>(document, key)? else {
        return Ok(Vec::new());
    };

    items
        .iter()
        .map(|item| {
            T::try_from_value(item).map_err(|source| SerializationError::InvalidField {
                field: key.to_string(),
                source,
            })
        })
        .collect()
}

// ============================================================================
// Serde bridge
// ============================================================================

/// Serializer for any serde type.
///
/// Timestamps and object ids are handed to serde as their text forms, so
/// `chrono` and `uuid` fields round-trip unchanged. The record's identifier
/// field must be `#[serde(skip)]`; the store manages `_id` itself.
pub struct SerdeSerializer<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T> SerdeSerializer<T> {
    pub fn new() -> Self {
        Self {
            marker: PhantomData,
        }
    }
}

impl<T> Default for SerdeSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Serializer<T> for SerdeSerializer<T>
where
    T: Serialize + DeserializeOwned,
{
    fn serialize(&self, record: &T) -> Result<Document, SerializationError> {
        let mut document = Document::from_json(serde_json::to_value(record)?)?;
        document.remove(ID_KEY);
        Ok(document)
    }

    fn deserialize(&self, document: &Document) -> Result<T, SerializationError> {
        let mut json = Map::new();
        for (key, value) in document.iter().filter(|(k, _)| k.as_str() != ID_KEY) {
            json.insert(key.clone(), plain_json(value));
        }
        Ok(serde_json::from_value(Json::Object(json))?)
    }
}

fn plain_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::Number(Number::from(*i)),
        Value::Float(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        Value::String(s) => Json::String(s.clone()),
        Value::Timestamp(t) => Json::String(t.to_rfc3339()),
        Value::ObjectId(id) => Json::String(id.to_hex()),
        Value::List(items) => Json::Array(items.iter().map(plain_json).collect()),
        Value::Document(doc) => Json::Object(
            doc.iter()
                .map(|(k, v)| (k.clone(), plain_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use serde::Deserialize;
    use warden_document::ObjectId;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Warning {
        target: String,
        points: i64,
        issued_at: DateTime<Utc>,
        note: Option<String>,
    }

    #[test]
    fn test_serde_round_trip() {
        let serializer = SerdeSerializer::<Warning>::new();
        let warning = Warning {
            target: "steve".into(),
            points: 3,
            issued_at: Utc::now(),
            note: None,
        };

        let doc = serializer.serialize(&warning).unwrap();
        assert_eq!(doc.get("points"), Some(&Value::Int(3)));

        let back = serializer.deserialize(&doc).unwrap();
        assert_eq!(back, warning);
    }

    #[test]
    fn test_serde_ignores_id_field() {
        let serializer = SerdeSerializer::<Warning>::new();
        let mut doc = Document::new()
            .with("target", "alex")
            .with("points", 1i64)
            .with("issued_at", "2024-01-15T10:30:00Z");
        doc.insert(ID_KEY, ObjectId::new());

        let warning = serializer.deserialize(&doc).unwrap();
        assert_eq!(warning.target, "alex");
    }

    #[test]
    fn test_serde_rejects_malformed() {
        let serializer = SerdeSerializer::<Warning>::new();
        let doc = Document::new().with("target", 5i64);
        assert!(matches!(
            serializer.deserialize(&doc),
            Err(SerializationError::Serde(_))
        ));
    }

    #[test]
    fn test_field_helpers() {
        let doc = Document::new()
            .with("name", "mod")
            .with("weight", "heavy")
            .with(
                "parents",
                vec![Value::from(ObjectId::new()), Value::from(ObjectId::new())],
            );

        assert_eq!(required::<String>(&doc, "name").unwrap(), "mod");
        assert!(matches!(
            required::<String>(&doc, "missing"),
            Err(SerializationError::MissingField(f)) if f == "missing"
        ));
        assert!(matches!(
            optional::<i64>(&doc, "weight"),
            Err(SerializationError::InvalidField { .. })
        ));
        assert_eq!(list_of::<ObjectId>(&doc, "parents").unwrap().len(), 2);
        assert!(list_of::<ObjectId>(&doc, "absent").unwrap().is_empty());
        assert!(list_of::<String>(&doc, "parents").is_err());
    }
}
