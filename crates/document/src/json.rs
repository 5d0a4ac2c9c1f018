//! Extended-JSON codec
//!
//! Scalars map onto plain JSON. The two kinds JSON cannot express are
//! wrapped in single-key objects:
//!
//! - object ids: `{"$oid": "5f1e2d3c4b5a69788796a5b4"}`
//! - timestamps: `{"$date": "2024-01-15T10:30:00Z"}`

use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value as Json};

use crate::{Document, ObjectIdError, Value};

const OID_KEY: &str = "$oid";
const DATE_KEY: &str = "$date";

/// Errors produced while decoding extended JSON
#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    /// Top-level JSON was not an object
    #[error("Expected a JSON object at the document root")]
    NotAnObject,

    /// A `$oid` wrapper held something other than a valid id
    #[error("Invalid $oid: {0}")]
    InvalidObjectId(#[from] ObjectIdError),

    /// A `$date` wrapper held something other than an RFC 3339 string
    #[error("Invalid $date: {0}")]
    InvalidDate(String),

    /// Text was not JSON at all
    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Document {
    /// Encode as an extended-JSON object
    pub fn to_json(&self) -> Json {
        Json::Object(
            self.iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        )
    }

    /// Decode from an extended-JSON object
    pub fn from_json(json: Json) -> Result<Self, JsonError> {
        match json {
            Json::Object(map) => object_to_document(map),
            _ => Err(JsonError::NotAnObject),
        }
    }

    /// Encode as pretty-printed extended-JSON text
    pub fn to_json_string(&self) -> Result<String, JsonError> {
        Ok(serde_json::to_string_pretty(&self.to_json())?)
    }

    /// Decode from extended-JSON text
    pub fn from_json_str(text: &str) -> Result<Self, JsonError> {
        Self::from_json(serde_json::from_str(text)?)
    }
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::Number(Number::from(*i)),
        Value::Float(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        Value::String(s) => Json::String(s.clone()),
        Value::Timestamp(t) => wrapper(DATE_KEY, t.to_rfc3339()),
        Value::ObjectId(id) => wrapper(OID_KEY, id.to_hex()),
        Value::List(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Document(doc) => doc.to_json(),
    }
}

fn wrapper(key: &str, text: String) -> Json {
    let mut map = Map::new();
    map.insert(key.to_string(), Json::String(text));
    Json::Object(map)
}

fn json_to_value(json: Json) -> Result<Value, JsonError> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::List(
            items
                .into_iter()
                .map(json_to_value)
                .collect::<Result<_, _>>()?,
        ),
        Json::Object(map) => object_to_value(map)?,
    })
}

fn object_to_value(map: Map<String, Json>) -> Result<Value, JsonError> {
    if map.len() == 1 {
        if let Some(Json::String(hex)) = map.get(OID_KEY) {
            return Ok(Value::ObjectId(hex.parse()?));
        }
        if let Some(Json::String(text)) = map.get(DATE_KEY) {
            let parsed = DateTime::parse_from_rfc3339(text)
                .map_err(|e| JsonError::InvalidDate(format!("{}: {}", text, e)))?;
            return Ok(Value::Timestamp(parsed.with_timezone(&Utc)));
        }
    }
    Ok(Value::Document(object_to_document(map)?))
}

fn object_to_document(map: Map<String, Json>) -> Result<Document, JsonError> {
    let mut doc = Document::new();
    for (key, json) in map {
        doc.insert(key, json_to_value(json)?);
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ObjectId;
    use serde_json::json;

    #[test]
    fn test_wrapped_kinds() {
        let id: ObjectId = "5f1e2d3c4b5a69788796a5b4".parse().unwrap();
        let at = DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let doc = Document::new().with("_id", id).with("seen", at);

        let json = doc.to_json();
        assert_eq!(json["_id"], json!({"$oid": "5f1e2d3c4b5a69788796a5b4"}));
        assert!(json["seen"]["$date"].as_str().unwrap().starts_with("2024-01-15T10:30:00"));

        let back = Document::from_json(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_numbers_keep_kind() {
        let doc = Document::from_json(json!({"a": 3, "b": 2.5})).unwrap();
        assert_eq!(doc.get("a"), Some(&Value::Int(3)));
        assert_eq!(doc.get("b"), Some(&Value::Float(2.5)));
    }

    #[test]
    fn test_nested_and_lists() {
        let doc = Document::from_json(json!({
            "settings": {"volume": 4},
            "names": ["a", "b"]
        }))
        .unwrap();
        let settings = doc.get("settings").and_then(Value::as_document).unwrap();
        assert_eq!(settings.get("volume"), Some(&Value::Int(4)));
        assert_eq!(doc.get("names").and_then(Value::as_list).map(|l| l.len()), Some(2));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            Document::from_json(json!([1, 2])),
            Err(JsonError::NotAnObject)
        ));
        assert!(matches!(
            Document::from_json(json!({"_id": {"$oid": "nope"}})),
            Err(JsonError::InvalidObjectId(_))
        ));
        assert!(matches!(
            Document::from_json_str("{not json"),
            Err(JsonError::Parse(_))
        ));
    }
}
