//! Join specifications
//!
//! A join entry is either a relation name (`"addresses"`) or a nested array
//! whose head is a relation name and whose tail are join entries on the
//! related type (`["addresses", ["person", "addresses"]]`), to any depth.

use crate::errors::DaoError;
use crate::schema::{RelationDef, Schema};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub relation: String,
    pub nested: JoinSpec,
}

impl Join {
    pub fn new(relation: &str) -> Self {
        Self {
            relation: relation.to_string(),
            nested: JoinSpec::new(),
        }
    }

    /// Also load `join` on the related records
    pub fn with(mut self, join: impl Into<Join>) -> Self {
        self.nested.entries.push(join.into());
        self
    }
}

impl From<&str> for Join {
    fn from(relation: &str) -> Self {
        Join::new(relation)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinSpec {
    entries: Vec<Join>,
}

/// A join checked against the schema
#[derive(Debug, Clone)]
pub struct ResolvedJoin {
    pub relation: &'static RelationDef,
    pub nested: Vec<ResolvedJoin>,
}

impl JoinSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON form; `null` means no joins
    pub fn from_value(value: &Value) -> Result<Self, DaoError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Array(entries) => entries
                .iter()
                .map(parse_entry)
                .collect::<Result<Vec<_>, _>>()
                .map(|entries| Self { entries }),
            other => Err(DaoError::argument(format!(
                "Joins must be a list of relation names, found {}",
                other
            ))),
        }
    }

    pub fn join(mut self, join: impl Into<Join>) -> Self {
        self.entries.push(join.into());
        self
    }

    pub fn extend(&mut self, other: JoinSpec) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Join] {
        &self.entries
    }

    /// The entry for `relation`, if requested
    pub fn get(&self, relation: &str) -> Option<&Join> {
        self.entries.iter().find(|join| join.relation == relation)
    }

    /// Resolve every entry against `schema`; unknown relations are an argument error
    pub fn resolve(&self, schema: &'static Schema) -> Result<Vec<ResolvedJoin>, DaoError> {
        self.entries
            .iter()
            .map(|join| {
                let relation = schema.relation(&join.relation).ok_or_else(|| {
                    DaoError::argument(format!(
                        "{} has no relation named '{}'",
                        schema.model, join.relation
                    ))
                })?;
                Ok(ResolvedJoin {
                    relation,
                    nested: join.nested.resolve(relation.target_schema())?,
                })
            })
            .collect()
    }
}

impl<const N: usize> From<[&str; N]> for JoinSpec {
    fn from(relations: [&str; N]) -> Self {
        Self {
            entries: relations.into_iter().map(Join::new).collect(),
        }
    }
}

impl From<Vec<Join>> for JoinSpec {
    fn from(entries: Vec<Join>) -> Self {
        Self { entries }
    }
}

fn parse_entry(entry: &Value) -> Result<Join, DaoError> {
    match entry {
        Value::String(relation) => Ok(Join::new(relation)),
        Value::Array(parts) => {
            let (head, tail) = parts.split_first().ok_or_else(|| {
                DaoError::argument("A nested join needs a relation name first")
            })?;
            let relation = head.as_str().ok_or_else(|| {
                DaoError::argument(format!("A nested join must start with a relation name, found {}", head))
            })?;
            let nested = tail.iter().map(parse_entry).collect::<Result<Vec<_>, _>>()?;
            Ok(Join {
                relation: relation.to_string(),
                nested: JoinSpec { entries: nested },
            })
        }
        other => Err(DaoError::argument(format!(
            "A join entry must be a relation name or a nested list, found {}",
            other
        ))),
    }
}
