//! Group store ownership and lookups

use std::sync::Arc;

use warden_document::ObjectId;
use warden_store::{DocumentCollection, DocumentStore};

use super::directory::GroupIndex;
use super::{Group, GroupDirectory, GroupSerializer, ResolvedGroup};
use crate::error::{CoreError, CoreResult, DefaultGroupError};
use crate::reporter::{report_skipped, Reporter};

/// Owns the group store and keeps the shared [`GroupDirectory`] in step
/// with it. Every write re-resolves the whole hierarchy.
pub struct GroupManager {
    store: DocumentStore<Group>,
    directory: GroupDirectory,
    reporter: Arc<dyn Reporter>,
}

impl GroupManager {
    /// Load every group from `collection` and resolve the hierarchy
    pub fn load(
        collection: Arc<dyn DocumentCollection>,
        reporter: Arc<dyn Reporter>,
    ) -> CoreResult<Self> {
        let manager = Self {
            store: DocumentStore::new(collection, Arc::new(GroupSerializer)),
            directory: GroupDirectory::default(),
            reporter,
        };
        manager.reload()?;
        tracing::info!(
            "Loaded {} groups from {}",
            manager.directory.len(),
            manager.store.name()
        );
        Ok(manager)
    }

    /// Re-read the collection and rebuild the directory
    pub fn reload(&self) -> CoreResult<()> {
        let report = self.store.reload()?;
        report_skipped(self.reporter.as_ref(), self.store.name(), report);
        self.reindex(true);
        Ok(())
    }

    /// Rebuild the directory from the store snapshot.
    ///
    /// Hierarchy issues are all reported when `announce_all` is set; otherwise
    /// only those the previous index did not already have.
    fn reindex(&self, announce_all: bool) {
        let index = GroupIndex::build(&self.store.snapshot());
        let previous = self.directory.current();
        for issue in index.issues() {
            if announce_all || !previous.issues().contains(issue) {
                self.reporter.report(issue.clone());
            }
        }
        self.directory.replace(index);
    }

    /// Shared read handle for permission holders
    pub fn directory(&self) -> GroupDirectory {
        self.directory.clone()
    }

    /// Underlying store, for attribute lookups
    pub fn store(&self) -> &DocumentStore<Group> {
        &self.store
    }

    pub fn group_by_id(&self, id: &ObjectId) -> Option<Arc<ResolvedGroup>> {
        self.directory.get(id)
    }

    pub fn group_by_name(&self, name: &str) -> Option<Arc<ResolvedGroup>> {
        self.directory.by_name(name)
    }

    pub fn groups(&self) -> Vec<Arc<ResolvedGroup>> {
        self.directory.all()
    }

    pub fn default_group(&self) -> Result<Arc<ResolvedGroup>, DefaultGroupError> {
        self.directory.default_group()
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Create and persist an empty group
    pub fn create_group(&self, name: &str) -> CoreResult<Group> {
        let mut group = Group::new(name);
        self.save_group(&mut group)?;
        tracing::info!("Created group {}", name);
        Ok(group)
    }

    /// Persist `group` (insert or replace) and re-resolve.
    ///
    /// Names are unique; saving a second group under a taken name fails.
    pub fn save_group(&self, group: &mut Group) -> CoreResult<ObjectId> {
        if let Some(existing) = self.directory.by_name(&group.name) {
            if group.id != Some(existing.id()) {
                return Err(CoreError::DuplicateGroup(group.name.clone()));
            }
        }

        let id = self.store.save(group)?;
        self.reindex(false);
        Ok(id)
    }

    /// Remove `group`. Holders and children referencing it drop the edge on
    /// their next resolution.
    pub fn delete_group(&self, group: &Group) -> CoreResult<()> {
        self.store.delete(group)?;
        self.reindex(false);
        tracing::info!("Deleted group {}", group.name);
        Ok(())
    }

    /// Make sure some group carries the default flag.
    ///
    /// With no default present, the group named `name` is flagged (and
    /// created if missing). Several defaults are left alone; that is a
    /// configuration error reported by [`default_group`](Self::default_group).
    pub fn ensure_default_group(&self, name: &str) -> CoreResult<()> {
        match self.directory.default_group() {
            Ok(_) | Err(DefaultGroupError::MultipleDefaultGroups(_)) => Ok(()),
            Err(DefaultGroupError::NoDefaultGroup) => {
                let mut group = self
                    .directory
                    .by_name(name)
                    .map(|g| Group::clone(g.record()))
                    .unwrap_or_else(|| Group::new(name));
                group.is_default = true;
                self.save_group(&mut group)?;
                tracing::info!("Flagged {} as the default group", name);
                Ok(())
            }
        }
    }
}
