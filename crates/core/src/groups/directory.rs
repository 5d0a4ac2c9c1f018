//! Resolved group index shared with permission holders

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use warden_document::ObjectId;
use warden_store::{Model, Snapshot};

use super::Group;
use crate::chat::ChatStyle;
use crate::error::{DefaultGroupError, UnresolvedGroupReference};
use crate::permissions::{resolve, PermissionMap, Permissible};
use crate::reporter::LoadIssue;

/// A stored group together with its resolved effective permissions
#[derive(Debug)]
pub struct ResolvedGroup {
    id: ObjectId,
    record: Arc<Group>,
    effective: PermissionMap,
}

impl ResolvedGroup {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn is_default(&self) -> bool {
        self.record.is_default
    }

    pub fn chat(&self) -> &ChatStyle {
        &self.record.chat
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.record.parents
    }

    /// The persisted record this view was built from
    pub fn record(&self) -> &Arc<Group> {
        &self.record
    }

    /// Effective permissions without cloning
    pub fn permissions(&self) -> &PermissionMap {
        &self.effective
    }
}

impl Permissible for ResolvedGroup {
    fn declared_permissions(&self) -> PermissionMap {
        self.record.permissions.clone()
    }

    fn effective_permissions(&self) -> PermissionMap {
        self.effective.clone()
    }
}

// ============================================================================
// Index
// ============================================================================

/// Immutable index over one store snapshot
#[derive(Debug, Default)]
pub(crate) struct GroupIndex {
    groups: Vec<Arc<ResolvedGroup>>,
    by_id: HashMap<ObjectId, usize>,
    issues: Vec<LoadIssue>,
}

impl GroupIndex {
    /// Resolve every group in `snapshot`.
    ///
    /// Parent edges to missing groups and edges closing a cycle are dropped
    /// and kept in [`issues`](Self::issues); the rest of the hierarchy still
    /// resolves.
    pub(crate) fn build(snapshot: &Snapshot<Group>) -> Self {
        let records: HashMap<ObjectId, &Arc<Group>> = snapshot
            .iter()
            .filter_map(|group| group.id().map(|id| (id, group)))
            .collect();

        let mut resolver = Resolver {
            records: &records,
            resolved: HashMap::with_capacity(records.len()),
            visiting: Vec::new(),
            issues: Vec::new(),
        };

        let mut index = Self::default();
        for group in snapshot.iter() {
            let Some(id) = group.id() else { continue };
            let effective = resolver.resolve(id);
            index.by_id.insert(id, index.groups.len());
            index.groups.push(Arc::new(ResolvedGroup {
                id,
                record: Arc::clone(group),
                effective,
            }));
        }
        index.issues = resolver.issues;
        index
    }

    /// Edges dropped while resolving, in discovery order
    pub(crate) fn issues(&self) -> &[LoadIssue] {
        &self.issues
    }

    fn get(&self, id: &ObjectId) -> Option<Arc<ResolvedGroup>> {
        self.by_id.get(id).map(|&i| Arc::clone(&self.groups[i]))
    }

    fn default_group(&self) -> Result<Arc<ResolvedGroup>, DefaultGroupError> {
        let defaults: Vec<&Arc<ResolvedGroup>> =
            self.groups.iter().filter(|g| g.is_default()).collect();

        match defaults.as_slice() {
            [group] => Ok(Arc::clone(group)),
            [] => Err(DefaultGroupError::NoDefaultGroup),
            many => Err(DefaultGroupError::MultipleDefaultGroups(
                many.iter().map(|g| g.name().to_string()).collect(),
            )),
        }
    }
}

/// Memoised depth-first resolution over parent edges
struct Resolver<'a> {
    records: &'a HashMap<ObjectId, &'a Arc<Group>>,
    resolved: HashMap<ObjectId, PermissionMap>,
    visiting: Vec<ObjectId>,
    issues: Vec<LoadIssue>,
}

impl Resolver<'_> {
    fn resolve(&mut self, id: ObjectId) -> PermissionMap {
        if let Some(done) = self.resolved.get(&id) {
            return done.clone();
        }
        let records = self.records;
        let Some(group) = records.get(&id).copied() else {
            return PermissionMap::new();
        };

        self.visiting.push(id);
        let mut inherited = Vec::with_capacity(group.parents.len());
        for parent in &group.parents {
            if self.visiting.contains(parent) {
                self.issues.push(LoadIssue::GroupCycle {
                    group: group.name.clone(),
                    parent: *parent,
                });
                continue;
            }
            if !records.contains_key(parent) {
                self.issues
                    .push(LoadIssue::UnresolvedGroup(UnresolvedGroupReference {
                        holder: format!("group {}", group.name),
                        group_id: *parent,
                    }));
                continue;
            }
            inherited.push(self.resolve(*parent));
        }
        self.visiting.pop();

        let effective = resolve(&group.permissions, inherited.iter());
        self.resolved.insert(id, effective.clone());
        effective
    }
}

// ============================================================================
// Directory
// ============================================================================

/// Cloneable read handle on the current group index.
///
/// Players hold one to look up their groups (and the default group) each
/// time they recompute. The owning manager swaps in a new index after every
/// group write.
#[derive(Debug, Clone, Default)]
pub struct GroupDirectory {
    index: Arc<RwLock<Arc<GroupIndex>>>,
}

impl GroupDirectory {
    pub(crate) fn replace(&self, index: GroupIndex) {
        *self.index.write() = Arc::new(index);
    }

    pub(crate) fn current(&self) -> Arc<GroupIndex> {
        self.index.read().clone()
    }

    /// Group by id
    pub fn get(&self, id: &ObjectId) -> Option<Arc<ResolvedGroup>> {
        self.current().get(id)
    }

    /// Group by exact name
    pub fn by_name(&self, name: &str) -> Option<Arc<ResolvedGroup>> {
        self.current()
            .groups
            .iter()
            .find(|g| g.name() == name)
            .cloned()
    }

    /// Every group, in store order
    pub fn all(&self) -> Vec<Arc<ResolvedGroup>> {
        self.current().groups.clone()
    }

    /// The single group flagged default
    pub fn default_group(&self) -> Result<Arc<ResolvedGroup>, DefaultGroupError> {
        self.current().default_group()
    }

    pub fn len(&self) -> usize {
        self.current().groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current().groups.is_empty()
    }
}
