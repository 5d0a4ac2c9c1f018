//! In-process collection

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use warden_document::{Document, ObjectId};

use super::{assign_id, DocumentCollection};
use crate::CollectionError;

/// Collection kept entirely in memory, keyed by document id.
///
/// Can be taken offline to exercise unavailable-storage paths.
pub struct MemoryCollection {
    name: String,
    documents: DashMap<ObjectId, Document>,
    online: AtomicBool,
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: DashMap::new(),
            online: AtomicBool::new(true),
        }
    }

    /// Simulate losing (or regaining) the connection
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn check_online(&self) -> Result<(), CollectionError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CollectionError::Unavailable(format!(
                "{} is offline",
                self.name
            )))
        }
    }
}

impl DocumentCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn find_all(&self) -> Result<Vec<Document>, CollectionError> {
        self.check_online()?;

        let mut entries: Vec<(ObjectId, Document)> = self
            .documents
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        Ok(entries.into_iter().map(|(_, doc)| doc).collect())
    }

    fn upsert(&self, mut document: Document) -> Result<ObjectId, CollectionError> {
        self.check_online()?;

        let id = assign_id(&mut document)?;
        self.documents.insert(id, document);
        Ok(id)
    }

    fn delete(&self, id: &ObjectId) -> Result<bool, CollectionError> {
        self.check_online()?;
        Ok(self.documents.remove(id).is_some())
    }
}
