//! Warden document stores
//!
//! A [`DocumentStore`] caches every record of one type in memory and writes
//! through to a backing [`DocumentCollection`]. Records implement [`Model`]
//! (usually derived) and are mapped to documents by a [`Serializer`].
//!
//! ```ignore
//! #[derive(Clone, Model)]
//! struct Warp {
//!     #[model(id)]
//!     id: Option<ObjectId>,
//!     name: String,
//! }
//!
//! let (warps, _) = DocumentStore::open(collection, Arc::new(WarpSerializer))?;
//! let spawn = warps.find_one("name", "spawn");
//! ```

// Lets derived impls name `::warden_store` from inside this crate's tests
extern crate self as warden_store;

mod attribute;
mod collection;
mod error;
mod model;
mod serializer;
mod store;

pub use warden_document as document;
pub use warden_macros::Model;

pub use attribute::{Attribute, AttributeTable, AttributeType};
pub use collection::{DocumentCollection, FileCollection, MemoryCollection};
pub use error::{CollectionError, SerializationError, StoreError, StoreResult};
pub use model::Model;
pub use serializer::{list_of, optional, required, SerdeSerializer, Serializer};
pub use store::{DocumentStore, ReloadReport, SkippedDocument, Snapshot};
