//! Warden Proc Macros
//!
//! This crate provides `#[derive(Model)]`, which turns a plain struct into a
//! record that a `DocumentStore` can persist and search by attribute.
//!
//! # Example
//!
//! ```ignore
//! use warden_store::{document::ObjectId, Model};
//!
//! #[derive(Debug, Clone, Model)]
//! pub struct Ban {
//!     #[model(id)]
//!     id: Option<ObjectId>,
//!
//!     target: String,
//!
//!     #[model(rename = "expires")]
//!     expires_at: Option<i64>,
//!
//!     #[model(skip)]
//!     notes: Vec<String>,
//! }
//!
//! // Generated:
//! // - Model::id() / Model::set_id() backed by the `id` field
//! // - Model::attributes() with accessors for "id", "target" and "expires"
//! ```
//!
//! # Attributes
//!
//! ## Field Attributes
//!
//! - `#[model(id)]` - **Required on exactly one field.** The `Option<ObjectId>`
//!   identifier assigned on first insert.
//! - `#[model(skip)]` - Not searchable. Use for maps, nested collections and
//!   any type without an `AttributeType` implementation.
//! - `#[model(rename = "name")]` - Look the attribute up under a different name.

mod model;
mod parse;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derive macro for stored records
///
/// Generates an implementation of `warden_store::Model`:
///
/// - `fn id(&self) -> Option<ObjectId>` reading the `#[model(id)]` field
/// - `fn set_id(&mut self, id: ObjectId)` writing it
/// - `fn attributes() -> &'static AttributeTable<Self>` - one accessor per
///   non-skipped field, built once on first use
///
/// Every non-skipped field type must implement `warden_store::AttributeType`.
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    model::derive_model(input).into()
}
