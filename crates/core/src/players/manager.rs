//! Player store ownership, loading and the online registry

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;
use warden_document::ObjectId;
use warden_store::{DocumentCollection, DocumentStore};

use super::asset::{Asset, AssetOwner, AssetRegistry};
use super::record::{PlayerRecord, PlayerSerializer};
use super::Player;
use crate::error::{CoreResult, UnresolvedGroupReference};
use crate::groups::GroupDirectory;
use crate::reporter::{report_skipped, LoadIssue, Reporter};

const UUID_ATTRIBUTE: &str = "uuid";
const USERNAME_ATTRIBUTE: &str = "username";

/// Owns the player store and the registry of connected players.
///
/// Offline players are built on demand from their stored record; connected
/// players are kept in the registry so every caller shares one instance.
pub struct PlayerManager {
    store: DocumentStore<PlayerRecord>,
    directory: GroupDirectory,
    assets: AssetRegistry,
    reporter: Arc<dyn Reporter>,
    online: DashMap<Uuid, Arc<Player>>,
}

impl PlayerManager {
    /// Load the player store
    pub fn load(
        collection: Arc<dyn DocumentCollection>,
        directory: GroupDirectory,
        assets: AssetRegistry,
        reporter: Arc<dyn Reporter>,
    ) -> CoreResult<Self> {
        let store = DocumentStore::new(collection, Arc::new(PlayerSerializer));
        let report = store.reload()?;
        report_skipped(reporter.as_ref(), store.name(), report);
        tracing::info!("Loaded {} players from {}", store.len(), store.name());

        Ok(Self {
            store,
            directory,
            assets,
            reporter,
            online: DashMap::new(),
        })
    }

    /// Underlying store, for attribute lookups
    pub fn store(&self) -> &DocumentStore<PlayerRecord> {
        &self.store
    }

    /// Registered asset factories
    pub fn asset_registry(&self) -> &AssetRegistry {
        &self.assets
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// The player with `unique_id`: the connected instance if online, else
    /// built from the stored record, else a fresh player with no record
    pub fn player(&self, unique_id: Uuid) -> Arc<Player> {
        if let Some(player) = self.online_player(unique_id) {
            return player;
        }

        match self.store.find_one(UUID_ATTRIBUTE, unique_id) {
            Some(record) => Arc::new(self.materialize(PlayerRecord::clone(&record))),
            None => Arc::new(Player::new(unique_id, self.directory.clone())),
        }
    }

    /// Player whose last known name is `username`
    pub fn find_by_username(&self, username: &str) -> Option<Arc<Player>> {
        let online = self
            .online
            .iter()
            .find(|entry| entry.value().last_known_username().as_deref() == Some(username))
            .map(|entry| Arc::clone(entry.value()));
        if online.is_some() {
            return online;
        }

        let record = self.store.find_one(USERNAME_ATTRIBUTE, username)?;
        Some(
            self.online_player(record.unique_id)
                .unwrap_or_else(|| Arc::new(self.materialize(PlayerRecord::clone(&record)))),
        )
    }

    fn materialize(&self, record: PlayerRecord) -> Player {
        let (groups, assets) = self.resolve_references(&record);
        Player::from_parts(record, groups, assets, self.directory.clone())
    }

    /// Resolve stored group ids and rebuild stored assets, reporting (and
    /// dropping) whatever fails
    fn resolve_references(&self, record: &PlayerRecord) -> (Vec<ObjectId>, Vec<Arc<dyn Asset>>) {
        let owner = AssetOwner {
            unique_id: record.unique_id,
            username: record.last_known_username.clone(),
        };

        let groups = record
            .groups
            .iter()
            .copied()
            .filter(|id| {
                let found = self.directory.get(id).is_some();
                if !found {
                    self.reporter
                        .report(LoadIssue::UnresolvedGroup(UnresolvedGroupReference {
                            holder: format!("player {}", owner),
                            group_id: *id,
                        }));
                }
                found
            })
            .collect();

        let assets = record
            .assets
            .iter()
            .filter_map(|entry| match self.assets.reconstruct(&owner, entry) {
                Ok(asset) => Some(asset),
                Err(e) => {
                    self.reporter.report(LoadIssue::Asset(e));
                    None
                }
            })
            .collect();

        (groups, assets)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write the player's current state
    pub fn save_player(&self, player: &Player) -> CoreResult<ObjectId> {
        let mut record = player.to_record();
        if record.id.is_none() {
            // A record may already exist for this player from another instance
            record.id = self
                .store
                .find_one(UUID_ATTRIBUTE, record.unique_id)
                .and_then(|existing| existing.id);
        }

        let id = self.store.save(&mut record)?;
        player.set_object_id(id);
        tracing::debug!("Saved player {}", player.unique_id());
        Ok(id)
    }

    /// Replace the player's state with what is currently stored.
    ///
    /// Returns false (leaving the player untouched) if nothing is stored.
    pub fn refresh_player(&self, player: &Player) -> CoreResult<bool> {
        let report = self.store.reload()?;
        report_skipped(self.reporter.as_ref(), self.store.name(), report);

        let Some(record) = self.store.find_one(UUID_ATTRIBUTE, player.unique_id()) else {
            return Ok(false);
        };
        let record = PlayerRecord::clone(&record);
        let (groups, assets) = self.resolve_references(&record);
        player.restore(record, groups, assets);
        Ok(true)
    }

    // ========================================================================
    // Connections
    // ========================================================================

    /// Register a connecting player.
    ///
    /// Records the login name and address, starts the session, saves, and
    /// makes the instance visible through [`online_player`](Self::online_player).
    pub fn connect(&self, unique_id: Uuid, username: &str, address: &str) -> CoreResult<Arc<Player>> {
        let player = self.player(unique_id);
        if player.record_username(username) {
            tracing::debug!("New username {} for {}", username, unique_id);
        }
        player.record_address(address);
        player.begin_session(Utc::now());
        player.reload_permissions();

        self.save_player(&player)?;
        self.online.insert(unique_id, Arc::clone(&player));
        tracing::info!("{} ({}) connected", username, unique_id);
        Ok(player)
    }

    /// Unregister a player, banking the session's online time.
    ///
    /// Returns `None` if the player was not connected. If the save fails the
    /// player stays registered, so the call can be retried.
    pub fn disconnect(&self, unique_id: Uuid) -> CoreResult<Option<Arc<Player>>> {
        let Some(player) = self.online_player(unique_id) else {
            return Ok(None);
        };

        let now = Utc::now();
        let session = player.bank_session(now, false);
        self.save_player(&player)?;

        player.bank_session(now, true);
        self.online.remove(&unique_id);
        tracing::info!("{} disconnected after {:?}", unique_id, session);
        Ok(Some(player))
    }

    pub fn online_player(&self, unique_id: Uuid) -> Option<Arc<Player>> {
        self.online.get(&unique_id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn online_players(&self) -> Vec<Arc<Player>> {
        self.online
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn online_count(&self) -> usize {
        self.online.len()
    }

    /// Recompute every connected player, e.g. after group edits
    pub fn reload_online_permissions(&self) {
        for player in self.online_players() {
            player.reload_permissions();
        }
    }

    /// Bank running sessions and save every connected player.
    ///
    /// Failures are logged and do not stop the flush. Returns the number of
    /// players saved.
    pub fn flush_online(&self) -> usize {
        let now = Utc::now();
        let mut saved = 0;
        for player in self.online_players() {
            player.bank_session(now, false);
            match self.save_player(&player) {
                Ok(_) => saved += 1,
                Err(e) => tracing::error!("Failed to save player {}: {}", player.unique_id(), e),
            }
        }
        saved
    }
}
