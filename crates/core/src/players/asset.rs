//! Player-owned assets and their factory registry
//!
//! Assets are stored as `{ "type": <kind>, "meta": { ... } }`. On load the
//! kind is looked up in an [`AssetRegistry`] populated at startup by each
//! asset type.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;
use warden_document::Document;

use crate::error::AssetReconstructionError;

const TYPE_KEY: &str = "type";
const META_KEY: &str = "meta";

/// An item owned by a player
pub trait Asset: Send + Sync + fmt::Debug {
    /// Registry key the asset is rebuilt from
    fn kind(&self) -> &str;

    /// Metadata persisted alongside the kind
    fn metadata(&self) -> Document;
}

/// The player an asset is being rebuilt for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetOwner {
    pub unique_id: Uuid,
    pub username: Option<String>,
}

impl fmt::Display for AssetOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.username {
            Some(name) => write!(f, "{} ({})", name, self.unique_id),
            None => write!(f, "{}", self.unique_id),
        }
    }
}

/// Builds an asset from its owner and stored metadata
pub type AssetFactory =
    Box<dyn Fn(&AssetOwner, &Document) -> Result<Arc<dyn Asset>, String> + Send + Sync>;

/// Kind -> factory lookup used while loading players
#[derive(Default)]
pub struct AssetRegistry {
    factories: HashMap<String, AssetFactory>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory; returns true if it replaced an earlier one
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F) -> bool
    where
        F: Fn(&AssetOwner, &Document) -> Result<Arc<dyn Asset>, String> + Send + Sync + 'static,
    {
        let kind = kind.into();
        tracing::debug!("Registered asset type {}", kind);
        self.factories.insert(kind, Box::new(factory)).is_some()
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Rebuild one stored asset entry
    pub(crate) fn reconstruct(
        &self,
        owner: &AssetOwner,
        entry: &Document,
    ) -> Result<Arc<dyn Asset>, AssetReconstructionError> {
        let malformed = |reason: String| AssetReconstructionError::Malformed {
            owner: owner.to_string(),
            reason,
        };

        let kind = entry
            .get_as::<String>(TYPE_KEY)
            .map_err(|e| malformed(format!("`{}`: {}", TYPE_KEY, e)))?
            .ok_or_else(|| malformed(format!("missing `{}`", TYPE_KEY)))?;
        let meta = entry
            .get_as::<Document>(META_KEY)
            .map_err(|e| malformed(format!("`{}`: {}", META_KEY, e)))?
            .unwrap_or_default();

        let factory = self
            .factories
            .get(&kind)
            .ok_or_else(|| AssetReconstructionError::UnknownType {
                owner: owner.to_string(),
                kind: kind.clone(),
            })?;

        let asset = factory(owner, &meta).map_err(|reason| AssetReconstructionError::Factory {
            owner: owner.to_string(),
            kind: kind.clone(),
            reason,
        })?;

        if asset.kind() != kind {
            return Err(AssetReconstructionError::Factory {
                owner: owner.to_string(),
                reason: format!("factory produced an asset of type `{}`", asset.kind()),
                kind,
            });
        }
        Ok(asset)
    }
}

impl fmt::Debug for AssetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&String> = self.factories.keys().collect();
        kinds.sort();
        f.debug_struct("AssetRegistry").field("kinds", &kinds).finish()
    }
}

/// Stored form of an asset
pub(crate) fn encode_asset(asset: &dyn Asset) -> Document {
    Document::new()
        .with(TYPE_KEY, asset.kind())
        .with(META_KEY, asset.metadata())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Cosmetic hat with a colour
    #[derive(Debug, PartialEq)]
    pub struct Hat {
        pub color: String,
    }

    impl Asset for Hat {
        fn kind(&self) -> &str {
            "hat"
        }

        fn metadata(&self) -> Document {
            Document::new().with("color", self.color.as_str())
        }
    }

    pub fn registry() -> AssetRegistry {
        let mut registry = AssetRegistry::new();
        registry.register("hat", |_owner: &AssetOwner, meta: &Document| {
            let color = meta
                .get_as::<String>("color")
                .map_err(|e| e.to_string())?
                .ok_or("hat without colour")?;
            Ok(Arc::new(Hat { color }) as Arc<dyn Asset>)
        });
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{registry, Hat};
    use super::*;

    fn owner() -> AssetOwner {
        AssetOwner {
            unique_id: Uuid::new_v4(),
            username: Some("steve".into()),
        }
    }

    #[test]
    fn test_encoded_asset_is_rebuilt() {
        let hat = Hat {
            color: "red".into(),
        };
        let entry = encode_asset(&hat);

        let asset = registry().reconstruct(&owner(), &entry).unwrap();
        assert_eq!(asset.kind(), "hat");
        assert_eq!(asset.metadata(), hat.metadata());
    }

    #[test]
    fn test_unknown_kind() {
        let entry = Document::new().with("type", "cape");
        assert!(matches!(
            registry().reconstruct(&owner(), &entry),
            Err(AssetReconstructionError::UnknownType { kind, .. }) if kind == "cape"
        ));
    }

    #[test]
    fn test_factory_failure_and_malformed_entry() {
        let entry = Document::new().with("type", "hat");
        assert!(matches!(
            registry().reconstruct(&owner(), &entry),
            Err(AssetReconstructionError::Factory { .. })
        ));

        let entry = Document::new().with("type", 3i64);
        assert!(matches!(
            registry().reconstruct(&owner(), &entry),
            Err(AssetReconstructionError::Malformed { .. })
        ));
    }

    #[test]
    fn test_factory_must_produce_its_kind() {
        let mut registry = registry();
        assert!(!registry.contains("boots"));
        registry.register("boots", |_: &AssetOwner, _: &Document| {
            Ok(Arc::new(Hat {
                color: "brown".into(),
            }) as Arc<dyn Asset>)
        });

        let entry = Document::new().with("type", "boots");
        assert!(matches!(
            registry.reconstruct(&owner(), &entry),
            Err(AssetReconstructionError::Factory { reason, .. }) if reason.contains("hat")
        ));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_owner_display() {
        let owner = owner();
        assert!(owner.to_string().starts_with("steve ("));
    }
}
