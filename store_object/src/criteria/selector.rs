//! Record selectors
//!
//! `by`/`value` pairs: a single field and value, or parallel sequences of
//! fields and values combined with AND-equality.

use crate::errors::DaoError;
use crate::id_type::RecordId;
use crate::query_builder::QueryFilter;
use crate::schema::Schema;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    by: Vec<String>,
    values: Vec<Value>,
}

impl Selector {
    pub fn new(by: &str, value: impl Into<Value>) -> Self {
        Self {
            by: vec![by.to_string()],
            values: vec![value.into()],
        }
    }

    /// Composite selector; lengths are checked when the selector is used
    pub fn parallel<V: Into<Value>>(
        by: impl IntoIterator<Item = impl Into<String>>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            by: by.into_iter().map(Into::into).collect(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Select by primary key
    pub fn id(schema: &Schema, id: RecordId) -> Self {
        Self::new(schema.primary_key, id)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.by.iter().map(String::as_str).zip(self.values.iter())
    }

    /// Equality filters for every pair
    pub fn to_filters(&self, schema: &Schema) -> Result<Vec<QueryFilter>, DaoError> {
        if self.by.len() != self.values.len() {
            return Err(DaoError::argument(format!(
                "Selector has {} field(s) but {} value(s)",
                self.by.len(),
                self.values.len()
            )));
        }
        if self.by.is_empty() {
            return Err(DaoError::argument("Selector needs at least one field"));
        }

        self.pairs()
            .map(|(by, value)| {
                let field = schema.field(by).ok_or_else(|| {
                    DaoError::argument(format!("{} has no field named '{}'", schema.model, by))
                })?;
                crate::query_builder::sql_generation::bind(field, value)
                    .map_err(|e| DaoError::argument(e.to_string()))?;
                Ok(QueryFilter::eq(field.name, value.clone()))
            })
            .collect()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .pairs()
            .map(|(by, value)| match value {
                Value::String(s) => format!("{} = {}", by, s),
                other => format!("{} = {}", by, other),
            })
            .collect::<Vec<_>>()
            .join(" and ");
        f.write_str(&rendered)
    }
}

impl<V: Into<Value>> From<(&str, V)> for Selector {
    fn from((by, value): (&str, V)) -> Self {
        Selector::new(by, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures::persons;
    use serde_json::json;

    #[test]
    fn mismatched_lengths_are_rejected() {
        let selector = Selector::parallel(["name", "tax_id"], [json!("Ada")]);
        let err = selector.to_filters(persons()).unwrap_err();
        assert_eq!(
            err,
            DaoError::Argument("Selector has 2 field(s) but 1 value(s)".to_string())
        );
    }

    #[test]
    fn composite_selector_is_and_of_equalities() {
        let selector = Selector::parallel(["name", "tax_id"], [json!("Ada"), json!(7)]);
        let filters = selector.to_filters(persons()).unwrap();
        assert_eq!(
            filters,
            vec![
                QueryFilter::eq("name", json!("Ada")),
                QueryFilter::eq("tax_id", json!(7)),
            ]
        );
        assert_eq!(selector.to_string(), "name = Ada and tax_id = 7");
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = Selector::new("nope", 1).to_filters(persons()).unwrap_err();
        assert!(matches!(err, DaoError::Argument(_)));
    }
}
