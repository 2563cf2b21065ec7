use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, parse_quote, Data, DeriveInput, Error, Field, Fields, Result};

use crate::parsing::{has_attribute, parse_table_attributes, ARCHIVED, CREATED_AT, UPDATED_AT};

/// Convenience attribute macro that adds all necessary derives for a database model
///
/// Usage:
/// ```rust,ignore
/// use recordhaus::prelude::*;
///
/// #[model]
/// #[table(name = "users")]
/// pub struct User {
///     #[primary_key]
///     pub id: Uuid,
///     #[field(unique)]
///     pub email: String,
/// }
/// ```
pub fn model_attribute(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut input = parse_macro_input!(item as DeriveInput);

    match extend_model(&mut input) {
        Ok(()) => {}
        Err(e) => return e.to_compile_error().into(),
    }

    let expanded = quote! {
        #[derive(
            Debug,
            Clone,
            store_object::serde::Serialize,
            store_object::serde::Deserialize,
            Record
        )]
        #[serde(crate = "store_object::serde")]
        #input
    };

    TokenStream::from(expanded)
}

/// Inject the bookkeeping columns and mark relation fields as optional in serde
fn extend_model(input: &mut DeriveInput) -> Result<()> {
    let table_info = parse_table_attributes(&input.attrs)?;

    let fields = match &mut input.data {
        Data::Struct(data) => match &mut data.fields {
            Fields::Named(named) => &mut named.named,
            other => return Err(Error::new_spanned(other, "model needs named fields")),
        },
        _ => {
            return Err(Error::new(
                proc_macro2::Span::call_site(),
                "model can only be used on structs",
            ))
        }
    };

    for field in fields.iter_mut() {
        if has_attribute(&field.attrs, "relation") {
            field
                .attrs
                .push(parse_quote!(#[serde(default, skip_serializing_if = "Option::is_none")]));
        }
    }

    let declared = |name: &str| fields.iter().any(|f| matches!(&f.ident, Some(ident) if ident == name));
    let mut injected: Vec<Field> = Vec::new();

    if !declared(CREATED_AT) {
        injected.push(parse_quote! {
            pub created_at: store_object::chrono::DateTime<store_object::chrono::Utc>
        });
    }
    if !declared(UPDATED_AT) {
        injected.push(parse_quote! {
            pub updated_at: store_object::chrono::DateTime<store_object::chrono::Utc>
        });
    }
    if !table_info.without_archive && !declared(ARCHIVED) {
        injected.push(parse_quote! {
            #[serde(default)]
            pub archived: bool
        });
    }

    fields.extend(injected);
    Ok(())
}
