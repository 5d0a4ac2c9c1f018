//! Stored record trait

use warden_document::ObjectId;

use crate::{Attribute, AttributeTable};

/// A typed record persisted through a [`DocumentStore`](crate::DocumentStore).
///
/// Usually derived with `#[derive(Model)]`. The identifier is `None` until the
/// first save and never changes afterwards.
pub trait Model: Clone + Send + Sync + 'static {
    /// Identifier assigned by the backing collection, if persisted
    fn id(&self) -> Option<ObjectId>;

    /// Record the identifier assigned on first insert
    fn set_id(&mut self, id: ObjectId);

    /// Searchable attributes of this record type
    fn attributes() -> &'static AttributeTable<Self>;
}

pub(crate) fn attribute<T: Model>(name: &str) -> Option<&'static Attribute<T>> {
    T::attributes().get(name)
}
