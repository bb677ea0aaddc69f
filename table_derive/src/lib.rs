//! Procedural macros for soft-delete aware table metadata
//!
//! `#[model]` is the entry point: it adds the serde derives and
//! `TableMetadata`, which generates column lists and DDL for the struct.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod model_macro;
mod parsing;
mod sql_generation;

use model_macro::model_attribute;
use parsing::{parse_field_attributes, parse_table_attributes};
use sql_generation::generate_table_metadata_impl;

/// Derive macro for the `TableMetadata` trait
///
/// Prefer `#[model]`, which adds this derive plus the serde derives and
/// flattens the lifecycle field.
///
/// Attributes:
/// - `#[table(name = "posts")]` on the struct (required)
/// - `#[index(is_active, created_at)]` on the struct, repeatable
/// - `#[primary_key]` on exactly one field
/// - `#[field(update, search, unique)]`: written by `save`, matched by
///   search, `UNIQUE` in the DDL;
///   a bare `#[field]` means `update`
/// - `#[lifecycle]` on a `Lifecycle` field to opt into soft delete
#[proc_macro_derive(TableMetadata, attributes(table, index, primary_key, field, lifecycle))]
pub fn derive_table_metadata(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;

    let table_info = match parse_table_attributes(&input.attrs) {
        Ok(attrs) => attrs,
        Err(e) => return e.to_compile_error().into(),
    };

    let field_info = match parse_field_attributes(&input.data, &table_info) {
        Ok(info) => info,
        Err(e) => return e.to_compile_error().into(),
    };

    generate_table_metadata_impl(name, &table_info, &field_info).into()
}

/// Convenience attribute macro that turns a struct into a model
///
/// ```ignore
/// use softhaus::prelude::*;
///
/// #[model]
/// #[table(name = "tags")]
/// pub struct Tag {
///     #[primary_key]
///     pub id: Uuid,
///     #[field(update, search)]
///     pub name: String,
///     #[lifecycle]
///     pub lifecycle: Lifecycle,
/// }
/// ```
#[proc_macro_attribute]
pub fn model(attr: TokenStream, item: TokenStream) -> TokenStream {
    model_attribute(attr, item)
}
