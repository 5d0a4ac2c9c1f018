//! Warden Document - storage-neutral record representation
//!
//! This crate defines the values exchanged between typed records and a
//! backing document collection:
//!
//! - [`Value`] / [`ValueKind`] - scalar, list and nested document values
//! - [`Document`] - an ordered string-keyed mapping of values
//! - [`ObjectId`] - the 12-byte identifier assigned on first insert
//! - [`FromValue`] - typed extraction used by serializers and settings
//!
//! # Example
//!
//! ```ignore
//! use warden_document::{Document, Value};
//!
//! let mut doc = Document::new();
//! doc.insert("name", "admin");
//! doc.insert("weight", 10i64);
//!
//! let name: Option<String> = doc.get_as("name")?;
//! assert_eq!(name.as_deref(), Some("admin"));
//! ```

mod document;
mod json;
mod object_id;
mod value;

pub use document::Document;
pub use json::JsonError;
pub use object_id::{ObjectId, ObjectIdError};
pub use value::{FromValue, Value, ValueError, ValueKind};

/// Name of the identifier field inside a stored document
pub const ID_KEY: &str = "_id";
