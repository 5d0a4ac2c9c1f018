//! Warden - Core Logic
//!
//! Groups, players and permission resolution on top of the document
//! stores in `warden-store`.
//!
//! # Re-exports
//!
//! - [`document`] - values, documents and object ids
//! - [`store`] - document stores and backing collections
//!
//! # Startup
//!
//! ```ignore
//! use std::sync::Arc;
//! use warden_core::{AssetRegistry, Core, CoreConfig, TracingReporter};
//!
//! let config = CoreConfig::load()?;
//! let core = Core::open(&config, AssetRegistry::new(), Arc::new(TracingReporter))?;
//!
//! let player = core.players().connect(uuid, "steve", "10.0.0.2")?;
//! if player.has_permission("world.build") {
//!     // ...
//! }
//!
//! core.shutdown();
//! ```

use std::sync::Arc;

pub use warden_document as document;
pub use warden_store as store;

mod chat;
pub mod config;
mod error;
pub mod groups;
pub mod permissions;
pub mod players;
mod reporter;

use warden_store::{DocumentCollection, FileCollection, MemoryCollection};

pub use chat::ChatStyle;
pub use config::{ConfigError, ConfigResult, CoreConfig, GroupsConfig, StorageBackend, StorageConfig};
pub use error::{
    AssetReconstructionError, CoreError, CoreResult, DefaultGroupError, UnresolvedGroupReference,
};
pub use groups::{Group, GroupDirectory, GroupManager, ResolvedGroup};
pub use permissions::{resolve, PermissionMap, Permissible};
pub use players::{Asset, AssetOwner, AssetRegistry, Player, PlayerManager, PlayerRecord, Profile};
pub use reporter::{LoadIssue, Reporter, TracingReporter};

/// Groups and players wired together
pub struct Core {
    groups: GroupManager,
    players: PlayerManager,
}

impl Core {
    /// Open the configured collections and load everything.
    ///
    /// Fails if storage is unreachable or if, after the optional default
    /// group creation, not exactly one group is flagged default.
    pub fn open(
        config: &CoreConfig,
        assets: AssetRegistry,
        reporter: Arc<dyn Reporter>,
    ) -> CoreResult<Self> {
        let (groups, players) = open_collections(&config.storage)?;
        Self::with_collections(groups, players, &config.groups, assets, reporter)
    }

    /// Load from already opened collections
    pub fn with_collections(
        groups: Arc<dyn DocumentCollection>,
        players: Arc<dyn DocumentCollection>,
        config: &GroupsConfig,
        assets: AssetRegistry,
        reporter: Arc<dyn Reporter>,
    ) -> CoreResult<Self> {
        let groups = GroupManager::load(groups, Arc::clone(&reporter))?;
        if config.create_default {
            groups.ensure_default_group(&config.default_group)?;
        }
        let default = groups.default_group()?;
        tracing::info!("Default group is {}", default.name());

        let players = PlayerManager::load(players, groups.directory(), assets, reporter)?;
        Ok(Self { groups, players })
    }

    pub fn groups(&self) -> &GroupManager {
        &self.groups
    }

    pub fn players(&self) -> &PlayerManager {
        &self.players
    }

    /// Recompute connected players after group edits
    pub fn refresh_permissions(&self) {
        self.players.reload_online_permissions();
    }

    /// Save every connected player. Returns the number saved.
    pub fn shutdown(&self) -> usize {
        tracing::info!("Warden shutting down...");
        let saved = self.players.flush_online();
        tracing::info!("Saved {} online players", saved);
        saved
    }
}

fn open_collections(
    storage: &StorageConfig,
) -> CoreResult<(Arc<dyn DocumentCollection>, Arc<dyn DocumentCollection>)> {
    match storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; nothing will be persisted");
            let groups: Arc<dyn DocumentCollection> =
                Arc::new(MemoryCollection::new(storage.groups_collection.as_str()));
            let players: Arc<dyn DocumentCollection> =
                Arc::new(MemoryCollection::new(storage.players_collection.as_str()));
            Ok((groups, players))
        }
        StorageBackend::File => {
            let root = config::resolve_against(&config::warden_base_dir()?, &storage.path);
            let groups: Arc<dyn DocumentCollection> = Arc::new(FileCollection::open(
                storage.groups_collection.as_str(),
                root.join(&storage.groups_collection),
            )?);
            let players: Arc<dyn DocumentCollection> = Arc::new(FileCollection::open(
                storage.players_collection.as_str(),
                root.join(&storage.players_collection),
            )?);
            Ok((groups, players))
        }
    }
}
