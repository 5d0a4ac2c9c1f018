//! Document form of a permission map
//!
//! Nodes may contain dots, so maps are stored as a list of
//! `{ node, value }` documents rather than as a nested document.

use warden_document::{Document, Value};
use warden_store::{list_of, required, SerializationError};

use super::PermissionMap;

const NODE_KEY: &str = "node";
const VALUE_KEY: &str = "value";

/// Write `permissions` under `key`, sorted by node
pub(crate) fn write_permissions(document: &mut Document, key: &str, permissions: &PermissionMap) {
    let mut nodes: Vec<(&String, &bool)> = permissions.iter().collect();
    nodes.sort();

    let entries: Vec<Value> = nodes
        .into_iter()
        .map(|(node, value)| {
            Value::from(
                Document::new()
                    .with(NODE_KEY, node.as_str())
                    .with(VALUE_KEY, *value),
            )
        })
        .collect();
    document.insert(key, entries);
}

/// Read the map stored under `key`; absent reads as empty
pub(crate) fn read_permissions(
    document: &Document,
    key: &str,
) -> Result<PermissionMap, SerializationError> {
    list_of::<Document>(document, key)?
        .iter()
        .map(|entry| -> Result<(String, bool), SerializationError> {
            let node: String = required(entry, NODE_KEY)?;
            let value: bool = required(entry, VALUE_KEY)?;
            Ok((node, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissions_survive_document_form() {
        let permissions = PermissionMap::from([
            ("world.build".to_string(), true),
            ("chat.color".to_string(), false),
        ]);

        let mut doc = Document::new();
        write_permissions(&mut doc, "permissions", &permissions);
        assert_eq!(doc.get("permissions").and_then(Value::as_list).map(<[Value]>::len), Some(2));

        assert_eq!(read_permissions(&doc, "permissions").unwrap(), permissions);
    }

    #[test]
    fn test_absent_permissions_are_empty() {
        assert!(read_permissions(&Document::new(), "permissions")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_entry_without_value_is_rejected() {
        let doc = Document::new().with(
            "permissions",
            vec![Value::from(Document::new().with("node", "fly"))],
        );
        assert!(matches!(
            read_permissions(&doc, "permissions"),
            Err(SerializationError::MissingField(f)) if f == "value"
        ));
    }
}
