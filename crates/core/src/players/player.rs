//! Live player aggregate

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;
use warden_document::{Document, FromValue, ObjectId, Value};

use super::asset::{encode_asset, Asset, AssetOwner};
use super::record::PlayerRecord;
use crate::chat::ChatStyle;
use crate::groups::{GroupDirectory, ResolvedGroup};
use crate::permissions::{resolve, PermissionMap, Permissible};

/// Identity and activity history of a player
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    /// Every name seen on login, oldest first, without duplicates
    pub known_usernames: Vec<String>,
    pub last_known_username: Option<String>,
    pub known_addresses: Vec<String>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub online_duration: Duration,
}

#[derive(Debug, Default)]
struct PlayerState {
    object_id: Option<ObjectId>,
    declared: PermissionMap,
    effective: PermissionMap,
    groups: Vec<ObjectId>,
    chat: ChatStyle,
    profile: Profile,
    settings: Document,
    assets: Vec<Arc<dyn Asset>>,
    /// Start of the current (or last flushed) session, if online
    session_start: Option<DateTime<Utc>>,
}

impl PlayerState {
    fn from_record(record: PlayerRecord, groups: Vec<ObjectId>, assets: Vec<Arc<dyn Asset>>) -> Self {
        let online_millis = u64::try_from(record.online_millis).unwrap_or(0);
        Self {
            object_id: record.id,
            declared: record.permissions,
            effective: PermissionMap::new(),
            groups,
            chat: record.chat,
            profile: Profile {
                known_usernames: record.known_usernames,
                last_known_username: record.last_known_username,
                known_addresses: record.known_addresses,
                first_seen: record.first_seen,
                last_seen: record.last_seen,
                online_duration: Duration::from_millis(online_millis),
            },
            settings: record.settings,
            assets,
            session_start: None,
        }
    }
}

/// A player, online or not.
///
/// Shared as `Arc<Player>`; every method takes `&self`. Permission changes
/// recompute the effective map under the same write lock, so no reader ever
/// observes a stale or half-built map once a mutating call has returned.
#[derive(Debug)]
pub struct Player {
    unique_id: Uuid,
    directory: GroupDirectory,
    state: RwLock<PlayerState>,
}

impl Player {
    /// A player with no stored data
    pub(crate) fn new(unique_id: Uuid, directory: GroupDirectory) -> Self {
        let player = Self {
            unique_id,
            directory,
            state: RwLock::new(PlayerState::default()),
        };
        player.reload_permissions();
        player
    }

    /// A player built from its record, with group ids and assets already
    /// resolved
    pub(crate) fn from_parts(
        record: PlayerRecord,
        groups: Vec<ObjectId>,
        assets: Vec<Arc<dyn Asset>>,
        directory: GroupDirectory,
    ) -> Self {
        let player = Self {
            unique_id: record.unique_id,
            directory,
            state: RwLock::new(PlayerState::from_record(record, groups, assets)),
        };
        player.reload_permissions();
        player
    }

    /// Replace all persisted state, keeping the running session
    pub(crate) fn restore(
        &self,
        record: PlayerRecord,
        groups: Vec<ObjectId>,
        assets: Vec<Arc<dyn Asset>>,
    ) {
        let mut state = self.state.write();
        let session_start = state.session_start;
        *state = PlayerState::from_record(record, groups, assets);
        state.session_start = session_start;
        self.recompute(&mut state);
    }

    /// Persisted form of the current state
    pub(crate) fn to_record(&self) -> PlayerRecord {
        let state = self.state.read();
        PlayerRecord {
            id: state.object_id,
            unique_id: self.unique_id,
            last_known_username: state.profile.last_known_username.clone(),
            known_usernames: state.profile.known_usernames.clone(),
            known_addresses: state.profile.known_addresses.clone(),
            first_seen: state.profile.first_seen,
            last_seen: state.profile.last_seen,
            online_millis: i64::try_from(state.profile.online_duration.as_millis())
                .unwrap_or(i64::MAX),
            settings: state.settings.clone(),
            assets: state.assets.iter().map(|a| encode_asset(a.as_ref())).collect(),
            permissions: state.declared.clone(),
            groups: state.groups.clone(),
            chat: state.chat.clone(),
        }
    }

    pub fn unique_id(&self) -> Uuid {
        self.unique_id
    }

    /// Store identifier, once the player has been saved
    pub fn object_id(&self) -> Option<ObjectId> {
        self.state.read().object_id
    }

    pub(crate) fn set_object_id(&self, id: ObjectId) {
        let mut state = self.state.write();
        if state.object_id.is_none() {
            state.object_id = Some(id);
        }
    }

    /// Owner descriptor handed to asset factories
    pub fn asset_owner(&self) -> AssetOwner {
        AssetOwner {
            unique_id: self.unique_id,
            username: self.last_known_username(),
        }
    }

    // ========================================================================
    // Permissions
    // ========================================================================

    fn recompute(&self, state: &mut PlayerState) {
        let groups = self.applicable_groups(&state.groups);
        state.effective = resolve(&state.declared, groups.iter().map(|g| g.permissions()));
    }

    /// Groups that take part in resolution: the memberships still alive, or
    /// the default group when none of them is
    fn applicable_groups(&self, ids: &[ObjectId]) -> Vec<Arc<ResolvedGroup>> {
        let live: Vec<Arc<ResolvedGroup>> = ids
            .iter()
            .filter_map(|id| {
                let group = self.directory.get(id);
                if group.is_none() {
                    tracing::debug!("Player {} skips missing group {}", self.unique_id, id);
                }
                group
            })
            .collect();
        if !live.is_empty() {
            return live;
        }

        match self.directory.default_group() {
            Ok(group) => vec![group],
            Err(e) => {
                tracing::warn!("Resolving {} without a default group: {}", self.unique_id, e);
                Vec::new()
            }
        }
    }

    /// Recompute the effective map from the current groups
    pub fn reload_permissions(&self) {
        let mut state = self.state.write();
        self.recompute(&mut state);
    }

    pub fn set_permission(&self, node: impl Into<String>, value: bool) {
        let mut state = self.state.write();
        state.declared.insert(node.into(), value);
        self.recompute(&mut state);
    }

    pub fn unset_permission(&self, node: &str) {
        let mut state = self.state.write();
        state.declared.remove(node);
        self.recompute(&mut state);
    }

    /// Add a membership; a no-op if already a member. Returns whether the
    /// membership list changed.
    pub fn add_to_group(&self, group: &ResolvedGroup) -> bool {
        let mut state = self.state.write();
        let changed = !state.groups.contains(&group.id());
        if changed {
            state.groups.push(group.id());
        }
        self.recompute(&mut state);
        changed
    }

    /// Remove a membership; a no-op if not a member
    pub fn remove_from_group(&self, group: &ResolvedGroup) -> bool {
        let mut state = self.state.write();
        let before = state.groups.len();
        state.groups.retain(|id| *id != group.id());
        let changed = state.groups.len() != before;
        self.recompute(&mut state);
        changed
    }

    /// Current memberships that still resolve, in priority order
    pub fn groups(&self) -> Vec<Arc<ResolvedGroup>> {
        let ids = self.state.read().groups.clone();
        ids.iter().filter_map(|id| self.directory.get(id)).collect()
    }

    /// Stored membership ids
    pub fn group_ids(&self) -> Vec<ObjectId> {
        self.state.read().groups.clone()
    }

    // ========================================================================
    // Chat
    // ========================================================================

    pub fn chat_style(&self) -> ChatStyle {
        self.state.read().chat.clone()
    }

    pub fn set_chat_style(&self, chat: ChatStyle) {
        self.state.write().chat = chat;
    }

    // ========================================================================
    // Profile
    // ========================================================================

    pub fn profile(&self) -> Profile {
        self.state.read().profile.clone()
    }

    pub fn known_usernames(&self) -> Vec<String> {
        self.state.read().profile.known_usernames.clone()
    }

    pub fn last_known_username(&self) -> Option<String> {
        self.state.read().profile.last_known_username.clone()
    }

    /// Note a login name. Returns true if it had never been seen.
    pub fn record_username(&self, username: &str) -> bool {
        let mut state = self.state.write();
        let profile = &mut state.profile;
        profile.last_known_username = Some(username.to_string());
        if profile.known_usernames.iter().any(|known| known == username) {
            return false;
        }
        profile.known_usernames.push(username.to_string());
        true
    }

    pub fn known_addresses(&self) -> Vec<String> {
        self.state.read().profile.known_addresses.clone()
    }

    /// Note a connecting address. Returns true if it had never been seen.
    pub fn record_address(&self, address: &str) -> bool {
        let mut state = self.state.write();
        let addresses = &mut state.profile.known_addresses;
        if addresses.iter().any(|known| known == address) {
            return false;
        }
        addresses.push(address.to_string());
        true
    }

    pub fn first_seen(&self) -> Option<DateTime<Utc>> {
        self.state.read().profile.first_seen
    }

    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.state.read().profile.last_seen
    }

    /// Total time spent online, excluding the running session
    pub fn online_duration(&self) -> Duration {
        self.state.read().profile.online_duration
    }

    pub fn add_online_time(&self, time: Duration) {
        let mut state = self.state.write();
        state.profile.online_duration = state.profile.online_duration.saturating_add(time);
    }

    /// Start a session at `now`, banking one that is still running
    pub(crate) fn begin_session(&self, now: DateTime<Utc>) {
        let mut state = self.state.write();
        if let Some(elapsed) = state
            .session_start
            .and_then(|start| (now - start).to_std().ok())
        {
            state.profile.online_duration = state.profile.online_duration.saturating_add(elapsed);
        }
        if state.profile.first_seen.is_none() {
            state.profile.first_seen = Some(now);
        }
        state.profile.last_seen = Some(now);
        state.session_start = Some(now);
    }

    /// Bank the time since the session started (or was last banked).
    ///
    /// With `end` the session is closed; otherwise it continues from `now`.
    pub(crate) fn bank_session(&self, now: DateTime<Utc>, end: bool) -> Duration {
        let mut state = self.state.write();
        let elapsed = state
            .session_start
            .and_then(|start| (now - start).to_std().ok())
            .unwrap_or_default();

        state.profile.online_duration = state.profile.online_duration.saturating_add(elapsed);
        state.profile.last_seen = Some(now);
        state.session_start = if end { None } else { Some(now) };
        elapsed
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Typed setting; `None` when absent or stored with another type
    pub fn setting<T: FromValue>(&self, key: &str) -> Option<T> {
        self.state.read().settings.get_as(key).ok().flatten()
    }

    /// Typed setting with a fallback
    pub fn setting_or<T: FromValue>(&self, key: &str, default: T) -> T {
        self.setting(key).unwrap_or(default)
    }

    pub fn store_setting(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.state.write().settings.insert(key, value);
    }

    pub fn remove_setting(&self, key: &str) -> Option<Value> {
        self.state.write().settings.remove(key)
    }

    pub fn contains_setting(&self, key: &str) -> bool {
        self.state.read().settings.contains_key(key)
    }

    // ========================================================================
    // Assets
    // ========================================================================

    pub fn give_asset(&self, asset: Arc<dyn Asset>) {
        self.state.write().assets.push(asset);
    }

    /// Remove this exact asset instance
    pub fn remove_asset(&self, asset: &Arc<dyn Asset>) -> bool {
        let mut state = self.state.write();
        let before = state.assets.len();
        state.assets.retain(|owned| !Arc::ptr_eq(owned, asset));
        state.assets.len() != before
    }

    pub fn assets(&self) -> Vec<Arc<dyn Asset>> {
        self.state.read().assets.clone()
    }
}

impl Permissible for Player {
    fn declared_permissions(&self) -> PermissionMap {
        self.state.read().declared.clone()
    }

    fn effective_permissions(&self) -> PermissionMap {
        self.state.read().effective.clone()
    }

    fn has_permission(&self, node: &str) -> bool {
        self.state.read().effective.get(node).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::{Group, GroupManager};
    use crate::players::asset::testing::Hat;
    use crate::reporter::testing::CollectingReporter;
    use warden_store::MemoryCollection;

    fn groups() -> GroupManager {
        GroupManager::load(
            Arc::new(MemoryCollection::new("groups")),
            Arc::new(CollectingReporter::default()),
        )
        .unwrap()
    }

    fn group(manager: &GroupManager, name: &str, perms: &[(&str, bool)]) -> Arc<ResolvedGroup> {
        let mut group = Group::new(name);
        for (node, value) in perms {
            group.set_permission(*node, *value);
        }
        let id = manager.save_group(&mut group).unwrap();
        manager.group_by_id(&id).unwrap()
    }

    fn player(manager: &GroupManager) -> Player {
        Player::new(Uuid::new_v4(), manager.directory())
    }

    #[test]
    fn test_default_deny_with_empty_default_group() {
        let manager = groups();
        manager.ensure_default_group("default").unwrap();
        let player = player(&manager);

        assert!(!player.has_permission("x"));
        assert!(player.effective_permissions().is_empty());
    }

    #[test]
    fn test_default_group_applies_without_memberships() {
        let manager = groups();
        let mut default = Group::new("default");
        default.is_default = true;
        default.set_permission("chat", true);
        manager.save_group(&mut default).unwrap();
        let vip = group(&manager, "vip", &[("fly", true)]);

        let player = player(&manager);
        assert!(player.has_permission("chat"));

        player.add_to_group(&vip);
        assert!(player.has_permission("fly"));
        assert!(!player.has_permission("chat"));

        player.remove_from_group(&vip);
        assert!(player.has_permission("chat"));
        assert!(!player.has_permission("fly"));
    }

    #[test]
    fn test_default_group_applies_after_sole_group_is_deleted() {
        let manager = groups();
        let mut default = Group::new("default");
        default.is_default = true;
        default.set_permission("chat", true);
        manager.save_group(&mut default).unwrap();
        let vip = group(&manager, "vip", &[("fly", true)]);

        let player = player(&manager);
        player.add_to_group(&vip);
        assert!(!player.has_permission("chat"));

        manager.delete_group(vip.record()).unwrap();
        player.reload_permissions();

        assert!(player.groups().is_empty());
        assert_eq!(player.group_ids(), vec![vip.id()]);
        assert!(player.has_permission("chat"));
        assert!(!player.has_permission("fly"));
    }

    #[test]
    fn test_declared_true_beats_group_false() {
        let manager = groups();
        let g1 = group(&manager, "g1", &[("a", false)]);
        let player = player(&manager);

        player.set_permission("a", true);
        player.add_to_group(&g1);
        assert_eq!(player.effective_permissions().get("a"), Some(&true));
    }

    #[test]
    fn test_later_group_promotes_declared_false() {
        let manager = groups();
        let g1 = group(&manager, "g1", &[("a", false)]);
        let g2 = group(&manager, "g2", &[("a", true)]);
        let player = player(&manager);

        player.set_permission("a", false);
        player.add_to_group(&g1);
        player.add_to_group(&g2);
        assert!(player.has_permission("a"));
    }

    #[test]
    fn test_membership_changes_are_idempotent() {
        let manager = groups();
        let g1 = group(&manager, "g1", &[("a", true)]);
        let player = player(&manager);
        player.set_permission("b", false);

        assert!(player.add_to_group(&g1));
        let declared = player.declared_permissions();
        let effective = player.effective_permissions();
        let ids = player.group_ids();

        assert!(!player.add_to_group(&g1));
        assert_eq!(player.declared_permissions(), declared);
        assert_eq!(player.effective_permissions(), effective);
        assert_eq!(player.group_ids(), ids);

        assert!(player.remove_from_group(&g1));
        assert!(!player.remove_from_group(&g1));
        assert!(player.group_ids().is_empty());
    }

    #[test]
    fn test_concurrent_edits_leave_consistent_permissions() {
        let manager = groups();
        let pool: Vec<Arc<ResolvedGroup>> = (0..4)
            .map(|i| {
                let name = format!("g{i}");
                group(&manager, &name, &[("shared", i % 2 == 0), (name.as_str(), true)])
            })
            .collect();
        let player = Arc::new(player(&manager));

        std::thread::scope(|scope| {
            for t in 0..4usize {
                let player = Arc::clone(&player);
                let pool = &pool;
                scope.spawn(move || {
                    for i in 0..200usize {
                        let group = &pool[(t + i) % pool.len()];
                        let node = format!("p{}", i % 5);
                        match (t + i) % 4 {
                            0 => {
                                player.add_to_group(group);
                            }
                            1 => {
                                player.remove_from_group(group);
                            }
                            2 => player.set_permission(node, i % 3 == 0),
                            _ => player.unset_permission(&node),
                        }
                    }
                });
            }
        });

        let groups = player.groups();
        let expected = resolve(
            &player.declared_permissions(),
            groups.iter().map(|g| g.permissions()),
        );
        assert_eq!(player.effective_permissions(), expected);

        let mut ids = player.group_ids();
        let len = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), len);
    }

    #[test]
    fn test_unset_permission_recomputes() {
        let manager = groups();
        let player = player(&manager);

        player.set_permission("home", true);
        assert!(player.has_permission("home"));
        player.unset_permission("home");
        assert!(!player.has_permission("home"));
        assert!(player.declared_permissions().is_empty());
    }

    #[test]
    fn test_group_edits_apply_on_reload() {
        let manager = groups();
        let g1 = group(&manager, "g1", &[]);
        let player = player(&manager);
        player.add_to_group(&g1);
        assert!(!player.has_permission("build"));

        let mut record = Group::clone(g1.record());
        record.set_permission("build", true);
        manager.save_group(&mut record).unwrap();

        assert!(!player.has_permission("build"));
        player.reload_permissions();
        assert!(player.has_permission("build"));
        assert_eq!(player.groups()[0].name(), "g1");
    }

    #[test]
    fn test_usernames_and_addresses_dedupe() {
        let player = player(&groups());

        assert!(player.record_username("alex"));
        assert!(player.record_username("al3x"));
        assert!(!player.record_username("alex"));
        assert_eq!(player.known_usernames(), vec!["alex", "al3x"]);
        assert_eq!(player.last_known_username().as_deref(), Some("alex"));

        assert!(player.record_address("10.0.0.1"));
        assert!(!player.record_address("10.0.0.1"));
        assert_eq!(player.known_addresses().len(), 1);
    }

    #[test]
    fn test_sessions_accumulate_online_time() {
        let player = player(&groups());
        let start = Utc::now();

        player.begin_session(start);
        assert_eq!(player.first_seen(), Some(start));

        let checkpoint = start + chrono::Duration::seconds(30);
        assert_eq!(player.bank_session(checkpoint, false), Duration::from_secs(30));

        let end = checkpoint + chrono::Duration::seconds(15);
        assert_eq!(player.bank_session(end, true), Duration::from_secs(15));
        assert_eq!(player.online_duration(), Duration::from_secs(45));
        assert_eq!(player.last_seen(), Some(end));
        assert_eq!(player.first_seen(), Some(start));

        // No running session
        assert_eq!(player.bank_session(end, true), Duration::ZERO);

        player.add_online_time(Duration::from_secs(5));
        assert_eq!(player.profile().online_duration, Duration::from_secs(50));
    }

    #[test]
    fn test_restarting_session_banks_running_one() {
        let player = player(&groups());
        let start = Utc::now();

        player.begin_session(start);
        player.begin_session(start + chrono::Duration::seconds(20));
        assert_eq!(player.online_duration(), Duration::from_secs(20));

        let end = start + chrono::Duration::seconds(25);
        assert_eq!(player.bank_session(end, true), Duration::from_secs(5));
        assert_eq!(player.online_duration(), Duration::from_secs(25));
        assert_eq!(player.first_seen(), Some(start));
    }

    #[test]
    fn test_settings() {
        let player = player(&groups());
        player.store_setting("volume", 7i64);
        player.store_setting("music", false);

        assert_eq!(player.setting::<i64>("volume"), Some(7));
        assert_eq!(player.setting::<String>("volume"), None);
        assert_eq!(player.setting_or("missing", 3i64), 3);
        assert!(!player.setting_or("music", true));
        assert!(player.contains_setting("music"));

        assert_eq!(player.remove_setting("music"), Some(Value::Bool(false)));
        assert!(!player.contains_setting("music"));
    }

    #[test]
    fn test_assets_and_record_snapshot() {
        let player = player(&groups());
        let hat: Arc<dyn Asset> = Arc::new(Hat {
            color: "blue".into(),
        });
        player.give_asset(hat.clone());
        player.record_username("steve");

        let record = player.to_record();
        assert_eq!(record.unique_id, player.unique_id());
        assert_eq!(record.assets.len(), 1);
        assert_eq!(record.assets[0].get_as::<String>("type"), Ok(Some("hat".into())));
        assert_eq!(player.asset_owner().username.as_deref(), Some("steve"));

        assert!(player.remove_asset(&hat));
        assert!(!player.remove_asset(&hat));
        assert!(player.assets().is_empty());
    }
}
