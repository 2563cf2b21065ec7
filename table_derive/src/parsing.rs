//! Parsing utilities for table, field and relation attributes
//!
//! This module handles the parsing of `#[table]`, `#[primary_key]`, `#[field]`
//! and `#[relation]` attributes and the validation of table and column names.

use quote::quote;
use syn::{
    parse::Parse, parse::ParseStream, Attribute, Data, Error, Fields, GenericArgument, Ident,
    LitStr, PathArguments, Result, Token, Type,
};
use type_mapping::{is_optional_type, rust_type_to_field_kind, validate_identifier, FieldKind};

/// Columns maintained by the runtime rather than by callers
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";
pub const ARCHIVED: &str = "archived";

/// Validate table name and return syn::Error for better proc macro error handling
pub fn validate_table_name_syn(name: &str, span: proc_macro2::Span) -> Result<()> {
    validate_identifier(name)
        .map_err(|e| Error::new(span, format!("Invalid table name '{}': {}", name, e)))
}

/// Validate field name and return syn::Error for better proc macro error handling
pub fn validate_field_name_syn(name: &str, span: proc_macro2::Span) -> Result<()> {
    validate_identifier(name)
        .map_err(|e| Error::new(span, format!("Invalid field name '{}': {}", name, e)))
}

#[derive(Debug)]
pub struct TableInfo {
    pub name: String,
    /// Set by `#[table(..., without_archive)]`: no `archived` column
    pub without_archive: bool,
}

pub fn parse_table_attributes(attrs: &[Attribute]) -> Result<TableInfo> {
    let mut table_name = None;
    let mut without_archive = false;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("table")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                validate_table_name_syn(&value.value(), value.span())?;
                table_name = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("without_archive") {
                without_archive = true;
                Ok(())
            } else {
                Err(meta.error("unsupported table option, expected `name` or `without_archive`"))
            }
        })?;
    }

    let name = table_name.ok_or_else(|| {
        Error::new(
            proc_macro2::Span::call_site(),
            "table attribute is required: add #[table(name = \"table_name\")] to your struct",
        )
    })?;

    Ok(TableInfo {
        name,
        without_archive,
    })
}

/// Options accepted by `#[field(...)]`
#[derive(Debug, Default, PartialEq)]
pub struct FieldOptions {
    pub unique: bool,
    pub enumeration: bool,
    pub json: bool,
}

impl Parse for FieldOptions {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut options = FieldOptions::default();

        while !input.is_empty() {
            let op: Ident = input.parse()?;
            match op.to_string().as_str() {
                "unique" => options.unique = true,
                "enumeration" => options.enumeration = true,
                "json" => options.json = true,
                other => {
                    return Err(Error::new(
                        op.span(),
                        format!("unknown field option `{}`", other),
                    ))
                }
            }

            if input.peek(Token![,]) {
                let _: Token![,] = input.parse()?;
            }
        }

        if options.enumeration && options.json {
            return Err(input.error("a field cannot be both `enumeration` and `json`"));
        }

        Ok(options)
    }
}

pub fn parse_field_options(attrs: &[Attribute]) -> Result<FieldOptions> {
    match attrs.iter().find(|attr| attr.path().is_ident("field")) {
        Some(attr) => match &attr.meta {
            syn::Meta::Path(_) => Ok(FieldOptions::default()),
            _ => attr.parse_args::<FieldOptions>(),
        },
        None => Ok(FieldOptions::default()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RelationKindAttr {
    HasMany,
    BelongsTo,
}

#[derive(Debug)]
pub struct RelationInfo {
    pub name: Ident,
    pub kind: RelationKindAttr,
    pub foreign_key: String,
    pub target: Type,
}

pub fn parse_relation_attribute(attr: &Attribute) -> Result<(RelationKindAttr, String)> {
    let mut kind = None;
    let mut foreign_key = None;

    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("has_many") {
            kind = Some(RelationKindAttr::HasMany);
            Ok(())
        } else if meta.path.is_ident("belongs_to") {
            kind = Some(RelationKindAttr::BelongsTo);
            Ok(())
        } else if meta.path.is_ident("foreign_key") {
            let value: LitStr = meta.value()?.parse()?;
            validate_field_name_syn(&value.value(), value.span())?;
            foreign_key = Some(value.value());
            Ok(())
        } else {
            Err(meta.error("expected `has_many`, `belongs_to` or `foreign_key = \"...\"`"))
        }
    })?;

    let kind = kind.ok_or_else(|| {
        Error::new_spanned(attr, "relation needs a kind: `has_many` or `belongs_to`")
    })?;
    let foreign_key = foreign_key
        .ok_or_else(|| Error::new_spanned(attr, "relation needs `foreign_key = \"column\"`"))?;

    Ok((kind, foreign_key))
}

/// Find the related model inside `Option<Vec<T>>`, `Option<Box<T>>` and friends
pub fn relation_target(ty: &Type) -> Type {
    const WRAPPERS: &[&str] = &["Option", "Vec", "Box"];

    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if WRAPPERS.contains(&segment.ident.to_string().as_str()) {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner)) = args.args.first() {
                        return relation_target(inner);
                    }
                }
            }
        }
    }
    ty.clone()
}

pub fn type_string(ty: &Type) -> String {
    quote!(#ty).to_string()
}

#[derive(Debug)]
pub struct ColumnInfo {
    pub ident: Ident,
    pub kind: FieldKind,
    pub nullable: bool,
    pub unique: bool,
    pub primary_key: bool,
}

#[derive(Debug)]
pub struct FieldInfo {
    pub columns: Vec<ColumnInfo>,
    pub relations: Vec<RelationInfo>,
    pub primary_key: Ident,
    pub has_archive: bool,
}

pub fn parse_field_attributes(data: &Data, table_info: &TableInfo) -> Result<FieldInfo> {
    let fields_named = match data {
        Data::Struct(data_struct) => match &data_struct.fields {
            Fields::Named(named) => named,
            _ => {
                return Err(Error::new(
                    proc_macro2::Span::call_site(),
                    "Record can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                proc_macro2::Span::call_site(),
                "Record can only be derived for structs",
            ))
        }
    };

    let mut columns = Vec::new();
    let mut relations = Vec::new();
    let mut primary_key = None;

    for field in &fields_named.named {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new_spanned(field, "Field must have a name"))?;
        let field_name_str = field_name.to_string();
        validate_field_name_syn(&field_name_str, field_name.span())?;

        if let Some(attr) = field.attrs.iter().find(|attr| attr.path().is_ident("relation")) {
            let (kind, foreign_key) = parse_relation_attribute(attr)?;
            if !is_optional_type(&type_string(&field.ty)) {
                return Err(Error::new_spanned(
                    &field.ty,
                    "relation fields must be wrapped in Option, they are only filled when joined",
                ));
            }
            relations.push(RelationInfo {
                name: field_name.clone(),
                kind,
                foreign_key,
                target: relation_target(&field.ty),
            });
            continue;
        }

        let options = parse_field_options(&field.attrs)?;
        let rust_type = type_string(&field.ty);
        let kind = if options.enumeration {
            FieldKind::Enum
        } else if options.json {
            FieldKind::Json
        } else {
            rust_type_to_field_kind(&rust_type).ok_or_else(|| {
                Error::new_spanned(
                    &field.ty,
                    format!(
                        "unsupported column type `{}`: annotate enums with #[field(enumeration)] and structured values with #[field(json)]",
                        rust_type
                    ),
                )
            })?
        };

        let is_primary_key = has_attribute(&field.attrs, "primary_key");
        if is_primary_key {
            if primary_key.is_some() {
                return Err(Error::new_spanned(field_name, "only one #[primary_key] is allowed"));
            }
            if !matches!(kind, FieldKind::Integer | FieldKind::Uuid) || is_optional_type(&rust_type) {
                return Err(Error::new_spanned(
                    &field.ty,
                    "primary keys must be a non-optional integer or Uuid",
                ));
            }
            primary_key = Some(field_name.clone());
        }

        columns.push(ColumnInfo {
            ident: field_name.clone(),
            kind,
            nullable: is_optional_type(&rust_type),
            unique: options.unique || is_primary_key,
            primary_key: is_primary_key,
        });
    }

    let primary_key = primary_key.ok_or_else(|| {
        Error::new(
            proc_macro2::Span::call_site(),
            "a #[primary_key] field is required",
        )
    })?;

    for required in [CREATED_AT, UPDATED_AT] {
        let column = columns.iter().find(|c| c.ident == required);
        if !matches!(column, Some(c) if c.kind == FieldKind::DateTime && !c.nullable) {
            return Err(Error::new(
                proc_macro2::Span::call_site(),
                format!("`{}: DateTime<Utc>` is required, use #[model] to add it", required),
            ));
        }
    }

    let archive_column = columns.iter().find(|c| c.ident == ARCHIVED);
    let has_archive = match archive_column {
        Some(column) if column.kind == FieldKind::Bool && !column.nullable => true,
        Some(column) => {
            return Err(Error::new_spanned(&column.ident, "`archived` must be a bool"));
        }
        None => false,
    };
    if has_archive && table_info.without_archive {
        return Err(Error::new_spanned(
            &primary_key,
            "`archived` is declared but the table is marked `without_archive`",
        ));
    }

    Ok(FieldInfo {
        columns,
        relations,
        primary_key,
        has_archive,
    })
}

pub fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::{parse_quote, DeriveInput};

    fn parse(input: DeriveInput) -> Result<(TableInfo, FieldInfo)> {
        let table = parse_table_attributes(&input.attrs)?;
        let fields = parse_field_attributes(&input.data, &table)?;
        Ok((table, fields))
    }

    #[test]
    fn test_valid_table_names() {
        for name in ["users", "user_profiles", "_private", "table123", "a"] {
            assert!(validate_table_name_syn(name, proc_macro2::Span::call_site()).is_ok());
        }
    }

    #[test]
    fn test_sql_injection_prevention() {
        let malicious_names = [
            "users; DROP TABLE users; --",
            "users' OR '1'='1",
            "users/**/UNION/**/SELECT",
            "SELECT",
        ];

        for name in malicious_names {
            assert!(
                validate_table_name_syn(name, proc_macro2::Span::call_site()).is_err(),
                "Should reject malicious name: {}",
                name
            );
        }
    }

    #[test]
    fn test_columns_and_relations() {
        let input: DeriveInput = parse_quote! {
            #[table(name = "persons")]
            pub struct PersonModel {
                #[primary_key]
                pub id: i64,
                #[field(unique)]
                pub tax_id: i64,
                pub nickname: Option<String>,
                #[field(enumeration)]
                pub gender: Gender,
                #[relation(has_many, foreign_key = "person_id")]
                pub addresses: Option<Vec<AddressModel>>,
                pub created_at: chrono::DateTime<chrono::Utc>,
                pub updated_at: chrono::DateTime<chrono::Utc>,
                pub archived: bool,
            }
        };

        let (table, fields) = parse(input).unwrap();
        assert_eq!(table.name, "persons");
        assert_eq!(fields.primary_key.to_string(), "id");
        assert!(fields.has_archive);

        let tax_id = fields.columns.iter().find(|c| c.ident == "tax_id").unwrap();
        assert!(tax_id.unique);
        let nickname = fields.columns.iter().find(|c| c.ident == "nickname").unwrap();
        assert!(nickname.nullable);
        assert_eq!(nickname.kind, FieldKind::Text);
        let gender = fields.columns.iter().find(|c| c.ident == "gender").unwrap();
        assert_eq!(gender.kind, FieldKind::Enum);

        assert_eq!(fields.relations.len(), 1);
        let relation = &fields.relations[0];
        assert_eq!(relation.kind, RelationKindAttr::HasMany);
        assert_eq!(relation.foreign_key, "person_id");
        assert_eq!(type_string(&relation.target), "AddressModel");
    }

    #[test]
    fn test_injected_timestamp_paths() {
        let input: DeriveInput = parse_quote! {
            #[table(name = "notes", without_archive)]
            pub struct Note {
                #[primary_key]
                pub id: i64,
                pub created_at: store_object::chrono::DateTime<store_object::chrono::Utc>,
                pub updated_at: store_object::chrono::DateTime<store_object::chrono::Utc>,
            }
        };

        let (_, fields) = parse(input).unwrap();
        let created_at = fields.columns.iter().find(|c| c.ident == "created_at").unwrap();
        assert_eq!(created_at.kind, FieldKind::DateTime);
        assert!(!created_at.nullable);
    }

    #[test]
    fn test_missing_table_attribute() {
        let input: DeriveInput = parse_quote! {
            pub struct Nameless {
                #[primary_key]
                pub id: i64,
            }
        };
        let err = parse(input).unwrap_err();
        assert!(err.to_string().contains("table attribute is required"));
    }

    #[test]
    fn test_relation_must_be_optional() {
        let input: DeriveInput = parse_quote! {
            #[table(name = "addresses")]
            pub struct AddressModel {
                #[primary_key]
                pub id: i64,
                #[relation(belongs_to, foreign_key = "person_id")]
                pub person: PersonModel,
            }
        };
        let err = parse(input).unwrap_err();
        assert!(err.to_string().contains("wrapped in Option"));
    }

    #[test]
    fn test_unknown_type_needs_annotation() {
        let input: DeriveInput = parse_quote! {
            #[table(name = "things")]
            pub struct Thing {
                #[primary_key]
                pub id: uuid::Uuid,
                pub payload: Payload,
            }
        };
        let err = parse(input).unwrap_err();
        assert!(err.to_string().contains("unsupported column type"));
    }

    #[test]
    fn test_relation_target_is_peeled() {
        let ty: Type = parse_quote!(Option<Box<PersonModel>>);
        assert_eq!(type_string(&relation_target(&ty)), "PersonModel");
    }
}
