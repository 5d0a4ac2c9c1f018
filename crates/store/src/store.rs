//! Cached write-through document store

use std::sync::Arc;

use parking_lot::RwLock;
use warden_document::{Document, ObjectId, Value, ID_KEY};

use crate::model::attribute;
use crate::{
    DocumentCollection, Model, SerializationError, Serializer, StoreResult,
};

/// Immutable view of every record a store believes exists
pub type Snapshot<T> = Arc<[Arc<T>]>;

/// A document dropped during reload
#[derive(Debug)]
pub struct SkippedDocument {
    /// The document's id, when it had a readable one
    pub id: Option<ObjectId>,
    pub error: SerializationError,
}

/// Outcome of a reload: how many records made it into the snapshot and
/// which documents were dropped
#[derive(Debug, Default)]
pub struct ReloadReport {
    pub loaded: usize,
    pub skipped: Vec<SkippedDocument>,
}

impl ReloadReport {
    /// True when no document was dropped
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Cache + CRUD facade over one backing collection.
///
/// Every write finishes with a full [`reload`](Self::reload), so a read issued
/// after a write returns is guaranteed to observe it. Reads only ever scan the
/// in-memory snapshot.
pub struct DocumentStore<T: Model> {
    collection: Arc<dyn DocumentCollection>,
    serializer: Arc<dyn Serializer<T>>,
    snapshot: RwLock<Snapshot<T>>,
}

impl<T: Model> DocumentStore<T> {
    /// Create a store with an empty snapshot. Call [`reload`](Self::reload)
    /// before reading.
    pub fn new(collection: Arc<dyn DocumentCollection>, serializer: Arc<dyn Serializer<T>>) -> Self {
        Self {
            collection,
            serializer,
            snapshot: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Create a store and load its snapshot
    pub fn open(
        collection: Arc<dyn DocumentCollection>,
        serializer: Arc<dyn Serializer<T>>,
    ) -> StoreResult<(Self, ReloadReport)> {
        let store = Self::new(collection, serializer);
        let report = store.reload()?;
        Ok((store, report))
    }

    /// Name of the backing collection
    pub fn name(&self) -> &str {
        self.collection.name()
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Insert or replace `record`, then reload.
    ///
    /// A record without an id is inserted and receives the id assigned by the
    /// collection. Nothing is written if serialization fails.
    #[tracing::instrument(skip(self, record), fields(collection = %self.name()))]
    pub fn save(&self, record: &mut T) -> StoreResult<ObjectId> {
        let mut document = self.serializer.serialize(record)?;
        if let Some(id) = record.id() {
            document.insert(ID_KEY, id);
        }

        let id = self.collection.upsert(document)?;
        if record.id().is_none() {
            record.set_id(id);
            tracing::debug!("Inserted {} into {}", id, self.name());
        }

        self.reload()?;
        Ok(id)
    }

    /// Same path as [`save`](Self::save); names an update of a known record
    pub fn update(&self, record: &mut T) -> StoreResult<ObjectId> {
        self.save(record)
    }

    /// Remove the document backing `record`, then reload.
    ///
    /// A record that was never saved, or whose document is already gone, is
    /// not an error.
    #[tracing::instrument(skip(self, record), fields(collection = %self.name()))]
    pub fn delete(&self, record: &T) -> StoreResult<()> {
        let Some(id) = record.id() else {
            tracing::debug!("Delete of unsaved record in {} ignored", self.name());
            return Ok(());
        };

        if !self.collection.delete(&id)? {
            tracing::debug!("Document {} already absent from {}", id, self.name());
        }
        self.reload()?;
        Ok(())
    }

    // ========================================================================
    // Cache
    // ========================================================================

    /// Re-fetch every document and atomically replace the snapshot.
    ///
    /// Documents that fail to deserialize are dropped and listed in the
    /// report; only an unreachable collection is an error.
    #[tracing::instrument(skip(self), fields(collection = %self.name()))]
    pub fn reload(&self) -> StoreResult<ReloadReport> {
        let documents = self.collection.find_all()?;

        let mut records = Vec::with_capacity(documents.len());
        let mut skipped = Vec::new();
        for document in &documents {
            match self.decode(document) {
                Ok(record) => records.push(Arc::new(record)),
                Err(error) => {
                    let id = document.get_as::<ObjectId>(ID_KEY).ok().flatten();
                    tracing::warn!(
                        "Dropping document {:?} from {}: {}",
                        id,
                        self.name(),
                        error
                    );
                    skipped.push(SkippedDocument { id, error });
                }
            }
        }

        let loaded = records.len();
        *self.snapshot.write() = Arc::from(records);
        tracing::debug!(
            "Reloaded {}: {} records, {} skipped",
            self.name(),
            loaded,
            skipped.len()
        );

        Ok(ReloadReport { loaded, skipped })
    }

    fn decode(&self, document: &Document) -> Result<T, SerializationError> {
        let id = crate::serializer::required::<ObjectId>(document, ID_KEY)?;
        let mut record = self.serializer.deserialize(document)?;
        record.set_id(id);
        Ok(record)
    }

    /// Current snapshot; cheap to clone and never mutated
    pub fn snapshot(&self) -> Snapshot<T> {
        self.snapshot.read().clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.read().is_empty()
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Record with the given id
    pub fn get_by_id(&self, id: &ObjectId) -> Option<Arc<T>> {
        self.snapshot()
            .iter()
            .find(|record| record.id().as_ref() == Some(id))
            .cloned()
    }

    /// First record whose attribute `name` equals `value`.
    ///
    /// Unknown attributes and values of the wrong kind find nothing.
    pub fn find_one(&self, name: &str, value: impl Into<Value>) -> Option<Arc<T>> {
        self.find_all(name, value).into_iter().next()
    }

    /// Every record whose attribute `name` equals `value`
    pub fn find_all(&self, name: &str, value: impl Into<Value>) -> Vec<Arc<T>> {
        let value = value.into();
        let Some(attribute) = attribute::<T>(name) else {
            return Vec::new();
        };
        if !attribute.accepts(&value) {
            return Vec::new();
        }

        self.snapshot()
            .iter()
            .filter(|record| attribute.matches(record, &value))
            .cloned()
            .collect()
    }
}
