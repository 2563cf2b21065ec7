//! Code generation for the `Record` implementation
//!
//! The generated `schema()` builds the field registry once per type and keeps
//! it in a `OnceLock`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{DeriveInput, LitStr};

use crate::parsing::{FieldInfo, RelationKindAttr, TableInfo};

pub fn generate_record_impl(
    input: &DeriveInput,
    table_info: &TableInfo,
    field_info: &FieldInfo,
) -> TokenStream {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let table = LitStr::new(&table_info.name, proc_macro2::Span::call_site());
    let model = LitStr::new(&name.to_string(), name.span());
    let primary_key = &field_info.primary_key;
    let primary_key_name = LitStr::new(&primary_key.to_string(), primary_key.span());

    let field_defs = field_info.columns.iter().map(|column| {
        let column_name = LitStr::new(&column.ident.to_string(), column.ident.span());
        let kind = format_ident!("{}", column.kind.variant_name());
        let nullable = column.nullable;
        let unique = column.unique;
        let is_primary_key = column.primary_key;
        quote! {
            store_object::FieldDef {
                name: #column_name,
                kind: store_object::FieldKind::#kind,
                nullable: #nullable,
                unique: #unique,
                primary_key: #is_primary_key,
            }
        }
    });

    let relation_defs = field_info.relations.iter().map(|relation| {
        let relation_name = LitStr::new(&relation.name.to_string(), relation.name.span());
        let foreign_key = LitStr::new(&relation.foreign_key, relation.name.span());
        let target = &relation.target;
        let kind = match relation.kind {
            RelationKindAttr::HasMany => quote! {
                store_object::RelationKind::HasMany { foreign_key: #foreign_key }
            },
            RelationKindAttr::BelongsTo => quote! {
                store_object::RelationKind::BelongsTo { foreign_key: #foreign_key }
            },
        };
        quote! {
            store_object::RelationDef {
                name: #relation_name,
                kind: #kind,
                target: <#target as store_object::Record>::schema,
            }
        }
    });

    let archive_field = if field_info.has_archive {
        quote! { Some("archived") }
    } else {
        quote! { None }
    };

    let is_archived = if field_info.has_archive {
        quote! {
            fn is_archived(&self) -> bool {
                self.archived
            }
        }
    } else {
        quote! {}
    };

    quote! {
        impl #impl_generics store_object::Record for #name #ty_generics #where_clause {
            fn schema() -> &'static store_object::Schema {
                static SCHEMA: ::std::sync::OnceLock<store_object::Schema> = ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| store_object::Schema {
                    table: #table,
                    model: #model,
                    primary_key: #primary_key_name,
                    archive_field: #archive_field,
                    fields: vec![#(#field_defs),*],
                    relations: vec![#(#relation_defs),*],
                })
            }

            fn id(&self) -> store_object::RecordId {
                store_object::HasRecordId::record_id(&self.#primary_key)
            }

            fn created_at(&self) -> store_object::chrono::DateTime<store_object::chrono::Utc> {
                self.created_at
            }

            fn updated_at(&self) -> store_object::chrono::DateTime<store_object::chrono::Utc> {
                self.updated_at
            }

            #is_archived
        }
    }
}
