//! Backing document collections
//!
//! A store needs only three primitives from its backing collection: list
//! every document, upsert one document, delete one document by id. Any
//! document-oriented database can provide them.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryCollection`] - process-local, for tests and ephemeral servers
//! - [`FileCollection`] - one extended-JSON file per document on disk

mod file;
mod memory;

use warden_document::{Document, ObjectId, ID_KEY};

use crate::CollectionError;

pub use file::FileCollection;
pub use memory::MemoryCollection;

/// A backing collection holding the documents of one record type.
///
/// Every call may block on I/O.
pub trait DocumentCollection: Send + Sync {
    /// Collection name, used in logs
    fn name(&self) -> &str;

    /// Every document currently stored
    fn find_all(&self) -> Result<Vec<Document>, CollectionError>;

    /// Insert or replace a document.
    ///
    /// A document carrying an `_id` replaces the stored document with that
    /// id. A document without one is inserted under a fresh id. Returns the
    /// id the document is stored under.
    fn upsert(&self, document: Document) -> Result<ObjectId, CollectionError>;

    /// Remove the document with `id`. Returns whether it existed.
    fn delete(&self, id: &ObjectId) -> Result<bool, CollectionError>;
}

/// Resolve the id a document will be stored under, assigning one if needed
fn assign_id(document: &mut Document) -> Result<ObjectId, CollectionError> {
    match document.get_as::<ObjectId>(ID_KEY)? {
        Some(id) => Ok(id),
        None => {
            let id = ObjectId::new();
            document.insert(ID_KEY, id);
            Ok(id)
        }
    }
}
