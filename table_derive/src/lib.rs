//! Procedural macros for generating record metadata
//!
//! This crate provides the `#[model]` attribute and the `Record` derive, which
//! together build the typed field registry (`store_object::Schema`) of a
//! struct at compile time.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod model_macro;
mod parsing;
mod schema_generation;

use model_macro::model_attribute;
use parsing::{parse_field_attributes, parse_table_attributes};
use schema_generation::generate_record_impl;

/// Derive macro for the `Record` trait
///
/// Note: It's recommended to use the `#[model]` attribute macro instead,
/// which adds the bookkeeping columns and the serde derives as well.
///
/// Manual usage:
/// ```rust,ignore
/// #[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Record)]
/// #[table(name = "addresses")]
/// pub struct AddressModel {
///     #[primary_key]
///     pub id: i64,
///     pub street: String,
///     pub person_id: i64,
///     #[relation(belongs_to, foreign_key = "person_id")]
///     #[serde(default, skip_serializing_if = "Option::is_none")]
///     pub person: Option<Box<PersonModel>>,
///     pub created_at: DateTime<Utc>,
///     pub updated_at: DateTime<Utc>,
///     pub archived: bool,
/// }
/// ```
///
/// Supported attributes:
/// - `#[table(name = "...")]`, optionally with `without_archive`
/// - `#[primary_key]` on one integer or `Uuid` field
/// - `#[field(unique)]`, `#[field(enumeration)]`, `#[field(json)]`
/// - `#[relation(has_many | belongs_to, foreign_key = "...")]` on `Option<...>` fields
#[proc_macro_derive(Record, attributes(table, primary_key, field, relation))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let table_info = match parse_table_attributes(&input.attrs) {
        Ok(attrs) => attrs,
        Err(e) => return e.to_compile_error().into(),
    };

    let field_info = match parse_field_attributes(&input.data, &table_info) {
        Ok(info) => info,
        Err(e) => return e.to_compile_error().into(),
    };

    TokenStream::from(generate_record_impl(&input, &table_info, &field_info))
}

/// Convenience attribute macro that adds all necessary derives for a database model
///
/// Injects `created_at` / `updated_at` timestamps and the `archived` flag
/// (unless `#[table(..., without_archive)]`) when the struct does not declare them.
///
/// Usage:
/// ```rust,ignore
/// use recordhaus::prelude::*;
///
/// #[model]
/// #[table(name = "persons")]
/// pub struct PersonModel {
///     #[primary_key]
///     pub id: i64,
///     #[field(unique)]
///     pub tax_id: i64,
///     pub name: String,
///     #[relation(has_many, foreign_key = "person_id")]
///     pub addresses: Option<Vec<AddressModel>>,
/// }
/// ```
#[proc_macro_attribute]
pub fn model(attr: TokenStream, item: TokenStream) -> TokenStream {
    model_attribute(attr, item)
}
