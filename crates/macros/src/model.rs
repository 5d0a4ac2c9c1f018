//! Model derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::parse::{parse_model, ModelArgs, ModelFieldArgs};

/// Generate the Model implementation
pub fn derive_model(input: DeriveInput) -> TokenStream {
    match parse_model(&input) {
        Ok(args) => generate_impl(args),
        Err(e) => e.write_errors(),
    }
}

fn generate_impl(args: ModelArgs) -> TokenStream {
    let struct_name = &args.ident;

    if !args.generics.params.is_empty() {
        return syn::Error::new_spanned(
            &args.generics,
            "Model cannot be derived for generic structs",
        )
        .to_compile_error();
    }

    let fields = match args.data {
        darling::ast::Data::Struct(fields) => fields.fields,
        _ => {
            return syn::Error::new_spanned(struct_name, "Model can only be derived for structs")
                .to_compile_error()
        }
    };

    let id_fields: Vec<&ModelFieldArgs> = fields.iter().filter(|f| f.id).collect();
    let id_field = match id_fields.as_slice() {
        [field] => field,
        [] => {
            return syn::Error::new_spanned(
                struct_name,
                "Model requires one field marked #[model(id)]",
            )
            .to_compile_error()
        }
        [_, second, ..] => {
            return syn::Error::new_spanned(
                &second.ident,
                "Only one field may be marked #[model(id)]",
            )
            .to_compile_error()
        }
    };
    let id_ident = &id_field.ident;

    let accessors = fields
        .iter()
        .filter(|f| !f.skip)
        .map(|f| generate_accessor(struct_name, f));

    quote! {
        impl ::warden_store::Model for #struct_name {
            fn id(&self) -> ::std::option::Option<::warden_store::document::ObjectId> {
                self.#id_ident
            }

            fn set_id(&mut self, id: ::warden_store::document::ObjectId) {
                self.#id_ident = ::std::option::Option::Some(id);
            }

            fn attributes() -> &'static ::warden_store::AttributeTable<Self> {
                static TABLE: ::std::sync::OnceLock<::warden_store::AttributeTable<#struct_name>> =
                    ::std::sync::OnceLock::new();

                TABLE.get_or_init(|| {
                    ::warden_store::AttributeTable::new()
                        #(#accessors)*
                })
            }
        }
    }
}

fn generate_accessor(struct_name: &syn::Ident, field: &ModelFieldArgs) -> TokenStream {
    let field_ident = &field.ident;
    let field_ty = &field.ty;
    let name = field.attribute_name().unwrap_or_default();

    quote! {
        .with(
            #name,
            <#field_ty as ::warden_store::AttributeType>::KIND,
            |record: &#struct_name| ::warden_store::AttributeType::to_value(&record.#field_ident),
        )
    }
}
