//! Group record and its document form

use warden_document::{Document, ObjectId, Value};
use warden_store::{list_of, optional, required, Model, SerializationError, Serializer};

use crate::chat::ChatStyle;
use crate::permissions::{read_permissions, write_permissions, PermissionMap};

const NAME_KEY: &str = "name";
const PERMISSIONS_KEY: &str = "permissions";
const PARENTS_KEY: &str = "parents";
const DEFAULT_KEY: &str = "default";

/// A named permission bundle as persisted.
///
/// Parents are resolved in order, exactly like a player's groups.
#[derive(Debug, Clone, PartialEq, Model)]
pub struct Group {
    #[model(id)]
    pub id: Option<ObjectId>,
    pub name: String,
    #[model(skip)]
    pub permissions: PermissionMap,
    #[model(skip)]
    pub parents: Vec<ObjectId>,
    #[model(rename = "default")]
    pub is_default: bool,
    #[model(skip)]
    pub chat: ChatStyle,
}

impl Group {
    /// A fresh, unsaved group
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            permissions: PermissionMap::new(),
            parents: Vec::new(),
            is_default: false,
            chat: ChatStyle::default(),
        }
    }

    pub fn set_permission(&mut self, node: impl Into<String>, value: bool) {
        self.permissions.insert(node.into(), value);
    }

    pub fn unset_permission(&mut self, node: &str) -> Option<bool> {
        self.permissions.remove(node)
    }

    /// Append a parent; returns false if it was already present
    pub fn add_parent(&mut self, parent: ObjectId) -> bool {
        if self.parents.contains(&parent) || self.id == Some(parent) {
            return false;
        }
        self.parents.push(parent);
        true
    }

    pub fn remove_parent(&mut self, parent: &ObjectId) -> bool {
        let before = self.parents.len();
        self.parents.retain(|p| p != parent);
        self.parents.len() != before
    }
}

/// Maps [`Group`] to and from its document
#[derive(Debug, Default, Clone, Copy)]
pub struct GroupSerializer;

impl Serializer<Group> for GroupSerializer {
    fn serialize(&self, group: &Group) -> Result<Document, SerializationError> {
        if group.name.trim().is_empty() {
            return Err(SerializationError::InvalidValue {
                field: NAME_KEY.into(),
                reason: "group name must not be empty".into(),
            });
        }

        let mut document = Document::new()
            .with(NAME_KEY, group.name.as_str())
            .with(DEFAULT_KEY, group.is_default)
            .with(
                PARENTS_KEY,
                group.parents.iter().copied().map(Value::from).collect::<Vec<_>>(),
            );
        write_permissions(&mut document, PERMISSIONS_KEY, &group.permissions);
        group.chat.write(&mut document);
        Ok(document)
    }

    fn deserialize(&self, document: &Document) -> Result<Group, SerializationError> {
        Ok(Group {
            id: None,
            name: required(document, NAME_KEY)?,
            permissions: read_permissions(document, PERMISSIONS_KEY)?,
            parents: list_of(document, PARENTS_KEY)?,
            is_default: optional(document, DEFAULT_KEY)?.unwrap_or(false),
            chat: ChatStyle::read(document)?,
        })
    }
}
