//! Typed field registry
//!
//! Every record type owns one `Schema`, generated by `#[derive(Record)]` and
//! built lazily on first use. Filter, order and join names are resolved
//! against it instead of being looked up at runtime by reflection.

use crate::errors::StoreError;
use type_mapping::FieldKind;

/// One stored column
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub nullable: bool,
    pub unique: bool,
    pub primary_key: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RelationKind {
    /// The related table holds `foreign_key`, pointing at this record's primary key
    HasMany { foreign_key: &'static str },
    /// This table holds `foreign_key`, pointing at the related record's primary key
    BelongsTo { foreign_key: &'static str },
}

/// A relation that can be eager-loaded by name
#[derive(Debug, Clone)]
pub struct RelationDef {
    pub name: &'static str,
    pub kind: RelationKind,
    pub target: fn() -> &'static Schema,
}

impl RelationDef {
    pub fn target_schema(&self) -> &'static Schema {
        (self.target)()
    }
}

#[derive(Debug)]
pub struct Schema {
    pub table: &'static str,
    /// Type name, used in error messages
    pub model: &'static str,
    pub primary_key: &'static str,
    pub archive_field: Option<&'static str>,
    pub fields: Vec<FieldDef>,
    pub relations: Vec<RelationDef>,
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn require_field(&self, name: &str) -> Result<&FieldDef, StoreError> {
        self.field(name).ok_or_else(|| StoreError::UnknownField {
            table: self.table,
            field: name.to_string(),
        })
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    pub fn primary_key_field(&self) -> Result<&FieldDef, StoreError> {
        self.require_field(self.primary_key)
    }

    pub fn supports_archive(&self) -> bool {
        self.archive_field.is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name)
    }

    /// Columns a uniqueness violation can be attributed to
    pub fn unique_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|field| field.unique || field.primary_key)
            .map(|field| field.name)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Hand-written schemas mirroring what `#[derive(Record)]` generates.

    use super::*;
    use std::sync::OnceLock;

    fn field(name: &'static str, kind: FieldKind) -> FieldDef {
        FieldDef {
            name,
            kind,
            nullable: false,
            unique: false,
            primary_key: false,
        }
    }

    fn bookkeeping() -> Vec<FieldDef> {
        vec![
            field("created_at", FieldKind::DateTime),
            field("updated_at", FieldKind::DateTime),
            field("archived", FieldKind::Bool),
        ]
    }

    pub fn persons() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            let mut fields = vec![
                FieldDef {
                    primary_key: true,
                    unique: true,
                    ..field("id", FieldKind::Integer)
                },
                FieldDef {
                    unique: true,
                    ..field("tax_id", FieldKind::Integer)
                },
                field("name", FieldKind::Text),
                field("birth_date", FieldKind::Date),
                FieldDef {
                    nullable: true,
                    ..field("nickname", FieldKind::Text)
                },
            ];
            fields.extend(bookkeeping());
            Schema {
                table: "persons",
                model: "PersonModel",
                primary_key: "id",
                archive_field: Some("archived"),
                fields,
                relations: vec![RelationDef {
                    name: "addresses",
                    kind: RelationKind::HasMany {
                        foreign_key: "person_id",
                    },
                    target: addresses,
                }],
            }
        })
    }

    pub fn addresses() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            let mut fields = vec![
                FieldDef {
                    primary_key: true,
                    unique: true,
                    ..field("id", FieldKind::Integer)
                },
                field("street", FieldKind::Text),
                field("person_id", FieldKind::Integer),
            ];
            fields.extend(bookkeeping());
            Schema {
                table: "addresses",
                model: "AddressModel",
                primary_key: "id",
                archive_field: Some("archived"),
                fields,
                relations: vec![RelationDef {
                    name: "person",
                    kind: RelationKind::BelongsTo {
                        foreign_key: "person_id",
                    },
                    target: persons,
                }],
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{addresses, persons};

    #[test]
    fn relations_resolve_to_target_schemas() {
        let relation = persons().relation("addresses").unwrap();
        assert_eq!(relation.target_schema().table, "addresses");
        let back = addresses().relation("person").unwrap();
        assert_eq!(back.target_schema().model, "PersonModel");
    }

    #[test]
    fn unique_columns_include_primary_key() {
        let columns: Vec<_> = persons().unique_columns().collect();
        assert_eq!(columns, vec!["id", "tax_id"]);
    }

    #[test]
    fn unknown_field_is_reported() {
        assert!(persons().require_field("shoe_size").is_err());
        assert!(persons().supports_archive());
    }
}
