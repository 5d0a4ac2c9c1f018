//! Persisted form of a player

use chrono::{DateTime, Utc};
use uuid::Uuid;
use warden_document::{Document, ObjectId, Value};
use warden_store::{list_of, optional, required, Model, SerializationError, Serializer};

use crate::chat::ChatStyle;
use crate::permissions::{read_permissions, write_permissions, PermissionMap};

const UUID_KEY: &str = "uuid";
const USERNAME_KEY: &str = "username";
const USERNAMES_KEY: &str = "usernames";
const ADDRESSES_KEY: &str = "addresses";
const FIRST_SEEN_KEY: &str = "first_seen";
const LAST_SEEN_KEY: &str = "last_seen";
const ONLINE_KEY: &str = "online_millis";
const SETTINGS_KEY: &str = "settings";
const ASSETS_KEY: &str = "assets";
const PERMISSIONS_KEY: &str = "permissions";
const GROUPS_KEY: &str = "groups";

/// Everything stored about a player.
///
/// Group references and assets are kept in their raw stored form here; the
/// player manager resolves them when building a live player.
#[derive(Debug, Clone, PartialEq, Model)]
pub struct PlayerRecord {
    #[model(id)]
    pub id: Option<ObjectId>,
    #[model(rename = "uuid")]
    pub unique_id: Uuid,
    #[model(rename = "username")]
    pub last_known_username: Option<String>,
    #[model(skip)]
    pub known_usernames: Vec<String>,
    #[model(skip)]
    pub known_addresses: Vec<String>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub online_millis: i64,
    #[model(skip)]
    pub settings: Document,
    #[model(skip)]
    pub assets: Vec<Document>,
    #[model(skip)]
    pub permissions: PermissionMap,
    #[model(skip)]
    pub groups: Vec<ObjectId>,
    #[model(skip)]
    pub chat: ChatStyle,
}

impl PlayerRecord {
    /// Record for a player seen for the first time
    pub fn new(unique_id: Uuid) -> Self {
        Self {
            id: None,
            unique_id,
            last_known_username: None,
            known_usernames: Vec::new(),
            known_addresses: Vec::new(),
            first_seen: None,
            last_seen: None,
            online_millis: 0,
            settings: Document::new(),
            assets: Vec::new(),
            permissions: PermissionMap::new(),
            groups: Vec::new(),
            chat: ChatStyle::default(),
        }
    }
}

fn strings(values: &[String]) -> Vec<Value> {
    values.iter().map(|s| Value::from(s.as_str())).collect()
}

/// Maps [`PlayerRecord`] to and from its document
#[derive(Debug, Default, Clone, Copy)]
pub struct PlayerSerializer;

impl Serializer<PlayerRecord> for PlayerSerializer {
    fn serialize(&self, record: &PlayerRecord) -> Result<Document, SerializationError> {
        if record.online_millis < 0 {
            return Err(SerializationError::InvalidValue {
                field: ONLINE_KEY.into(),
                reason: "online time must not be negative".into(),
            });
        }

        let mut document = Document::new()
            .with(UUID_KEY, record.unique_id)
            .with(USERNAME_KEY, record.last_known_username.clone())
            .with(USERNAMES_KEY, strings(&record.known_usernames))
            .with(ADDRESSES_KEY, strings(&record.known_addresses))
            .with(FIRST_SEEN_KEY, record.first_seen)
            .with(LAST_SEEN_KEY, record.last_seen)
            .with(ONLINE_KEY, record.online_millis)
            .with(SETTINGS_KEY, record.settings.clone())
            .with(
                ASSETS_KEY,
                record.assets.iter().cloned().map(Value::from).collect::<Vec<_>>(),
            )
            .with(
                GROUPS_KEY,
                record.groups.iter().copied().map(Value::from).collect::<Vec<_>>(),
            );
        write_permissions(&mut document, PERMISSIONS_KEY, &record.permissions);
        record.chat.write(&mut document);
        Ok(document)
    }

    fn deserialize(&self, document: &Document) -> Result<PlayerRecord, SerializationError> {
        Ok(PlayerRecord {
            id: None,
            unique_id: required(document, UUID_KEY)?,
            last_known_username: optional(document, USERNAME_KEY)?,
            known_usernames: list_of(document, USERNAMES_KEY)?,
            known_addresses: list_of(document, ADDRESSES_KEY)?,
            first_seen: optional(document, FIRST_SEEN_KEY)?,
            last_seen: optional(document, LAST_SEEN_KEY)?,
            online_millis: optional(document, ONLINE_KEY)?.unwrap_or(0),
            settings: optional(document, SETTINGS_KEY)?.unwrap_or_default(),
            assets: list_of(document, ASSETS_KEY)?,
            permissions: read_permissions(document, PERMISSIONS_KEY)?,
            groups: list_of(document, GROUPS_KEY)?,
            chat: ChatStyle::read(document)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> PlayerRecord {
        let mut record = PlayerRecord::new(Uuid::new_v4());
        record.last_known_username = Some("alex".into());
        record.known_usernames = vec!["al".into(), "alex".into()];
        record.known_addresses = vec!["10.0.0.7".into()];
        record.first_seen = Some(Utc::now());
        record.last_seen = record.first_seen;
        record.online_millis = 90_000;
        record.settings = Document::new().with("music", false).with("volume", 7i64);
        record.assets = vec![Document::new().with("type", "hat")];
        record.permissions.insert("home.set".into(), true);
        record.groups = vec![ObjectId::new()];
        record.chat.color = Some("aqua".into());
        record
    }

    #[test]
    fn test_record_round_trip() {
        let record = populated();
        let doc = PlayerSerializer.serialize(&record).unwrap();

        assert_eq!(
            doc.get_as::<String>("uuid").unwrap(),
            Some(record.unique_id.to_string())
        );
        assert_eq!(PlayerSerializer.deserialize(&doc).unwrap(), record);
    }

    #[test]
    fn test_minimal_document() {
        let id = Uuid::new_v4();
        let doc = Document::new().with("uuid", id);

        let record = PlayerSerializer.deserialize(&doc).unwrap();
        assert_eq!(record, PlayerRecord::new(id));
    }

    #[test]
    fn test_bad_uuid_is_rejected() {
        let doc = Document::new().with("uuid", "not-a-uuid");
        assert!(matches!(
            PlayerSerializer.deserialize(&doc),
            Err(SerializationError::InvalidField { field, .. }) if field == "uuid"
        ));
        assert!(PlayerSerializer.deserialize(&Document::new()).is_err());
    }

    #[test]
    fn test_negative_online_time_not_written() {
        let mut record = populated();
        record.online_millis = -1;
        assert!(PlayerSerializer.serialize(&record).is_err());
    }

    #[test]
    fn test_lookup_attributes() {
        let table = PlayerRecord::attributes();
        assert!(table.get("uuid").is_some());
        assert!(table.get("username").is_some());
        assert!(table.get("online_millis").is_some());
        assert!(table.get("settings").is_none());
        assert!(table.get("unique_id").is_none());
    }
}
