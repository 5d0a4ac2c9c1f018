//! Error types for the core

use warden_document::ObjectId;
use warden_store::{CollectionError, StoreError};

use crate::config::ConfigError;

/// An owned asset could not be rebuilt while loading a player.
///
/// Never fatal: the asset is reported and left out of the player.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetReconstructionError {
    /// No factory is registered under the stored type id
    #[error("Unknown asset type `{kind}` for player {owner}")]
    UnknownType { owner: String, kind: String },

    /// The factory rejected the stored metadata
    #[error("Asset `{kind}` for player {owner} failed to load: {reason}")]
    Factory {
        owner: String,
        kind: String,
        reason: String,
    },

    /// The stored entry is not a `{type, meta}` document
    #[error("Malformed asset entry for player {owner}: {reason}")]
    Malformed { owner: String, reason: String },
}

/// A stored group id no longer names a live group.
///
/// Never fatal: the membership (or parent edge) is dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{holder} references missing group {group_id}")]
pub struct UnresolvedGroupReference {
    /// Player or group holding the reference
    pub holder: String,
    pub group_id: ObjectId,
}

/// The default group flag is not set on exactly one group
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefaultGroupError {
    #[error("No group is flagged as default")]
    NoDefaultGroup,

    #[error("Multiple groups are flagged as default: {}", .0.join(", "))]
    MultipleDefaultGroups(Vec<String>),
}

/// Errors surfaced by core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A backing collection could not be opened
    #[error("Failed to open collection: {0}")]
    Collection(#[from] CollectionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    DefaultGroup(#[from] DefaultGroupError),

    /// A group with this name already exists
    #[error("Group `{0}` already exists")]
    DuplicateGroup(String),
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
