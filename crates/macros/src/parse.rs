//! Attribute parsing for the Model derive macro

use darling::{FromDeriveInput, FromField};
use syn::{DeriveInput, Generics, Ident, Type};

/// Parsed #[model(...)] input for the struct
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(model), supports(struct_named))]
pub struct ModelArgs {
    /// Struct identifier
    pub ident: Ident,

    /// Struct generics (must be empty)
    pub generics: Generics,

    /// Struct fields
    pub data: darling::ast::Data<(), ModelFieldArgs>,
}

/// Parsed #[model(...)] attributes on a field
#[derive(Debug, FromField)]
#[darling(attributes(model))]
pub struct ModelFieldArgs {
    /// Field identifier
    pub ident: Option<Ident>,

    /// Field type
    pub ty: Type,

    /// This field holds the record identifier
    #[darling(default)]
    pub id: bool,

    /// Leave this field out of the attribute table
    #[darling(default)]
    pub skip: bool,

    /// Attribute name override
    #[darling(default)]
    pub rename: Option<String>,
}

impl ModelFieldArgs {
    /// Name the attribute is looked up by
    pub fn attribute_name(&self) -> Option<String> {
        self.rename
            .clone()
            .or_else(|| self.ident.as_ref().map(|i| i.to_string()))
    }
}

/// Parse a DeriveInput into ModelArgs
pub fn parse_model(input: &DeriveInput) -> darling::Result<ModelArgs> {
    ModelArgs::from_derive_input(input)
}
