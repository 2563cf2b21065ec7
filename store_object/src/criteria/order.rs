//! Order specifications
//!
//! Parsed from a JSON object such as `{"name": "asc", "id": "desc"}`. The
//! object's insertion order is the sort key order.

use crate::errors::DaoError;
use crate::query_builder::{QueryBuilder, SortOrder};
use crate::schema::Schema;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderSpec {
    terms: Vec<(String, SortOrder)>,
}

impl OrderSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON form; `null` means no ordering
    pub fn from_value(value: &Value) -> Result<Self, DaoError> {
        let map = match value {
            Value::Null => return Ok(Self::new()),
            Value::Object(map) => map,
            other => {
                return Err(DaoError::argument(format!(
                    "An ordering must be an object of field: direction pairs, found {}",
                    other
                )))
            }
        };

        let terms = map
            .iter()
            .map(|(field, direction)| {
                let direction = direction.as_str().ok_or_else(|| {
                    DaoError::argument(format!("Sort direction for '{}' must be a string", field))
                })?;
                let order = direction.parse::<SortOrder>().map_err(DaoError::Argument)?;
                Ok((field.clone(), order))
            })
            .collect::<Result<Vec<_>, DaoError>>()?;

        Ok(Self { terms })
    }

    pub fn asc(mut self, field: &str) -> Self {
        self.terms.push((field.to_string(), SortOrder::Asc));
        self
    }

    pub fn desc(mut self, field: &str) -> Self {
        self.terms.push((field.to_string(), SortOrder::Desc));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[(String, SortOrder)] {
        &self.terms
    }

    /// Append the ordering to `query`, rejecting fields the schema does not know
    pub fn apply(&self, schema: &Schema, mut query: QueryBuilder) -> Result<QueryBuilder, DaoError> {
        for (field, order) in &self.terms {
            let def = schema.field(field).ok_or_else(|| {
                DaoError::argument(format!(
                    "Cannot order {} by unknown field '{}'",
                    schema.model, field
                ))
            })?;
            query = query.order_by(def.name, *order);
        }
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures::persons;
    use serde_json::json;

    #[test]
    fn keeps_insertion_order() {
        let spec = OrderSpec::from_value(&json!({"name": "asc", "id": "DESC"})).unwrap();
        assert_eq!(
            spec.terms(),
            &[
                ("name".to_string(), SortOrder::Asc),
                ("id".to_string(), SortOrder::Desc)
            ]
        );
    }

    #[test]
    fn bad_direction_is_an_argument_error() {
        let err = OrderSpec::from_value(&json!({"name": "up"})).unwrap_err();
        assert!(matches!(err, DaoError::Argument(ref msg) if msg.contains("'up'")));
    }

    #[test]
    fn unknown_field_is_rejected_on_apply() {
        let err = OrderSpec::new()
            .asc("height")
            .apply(persons(), QueryBuilder::new())
            .unwrap_err();
        assert!(matches!(err, DaoError::Argument(_)));

        let query = OrderSpec::new().desc("name").apply(persons(), QueryBuilder::new()).unwrap();
        assert_eq!(query.ordering(), &[("name".to_string(), SortOrder::Desc)]);
    }
}
