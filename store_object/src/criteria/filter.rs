//! Filter specifications
//!
//! A filter maps field names to one of:
//! - a scalar: equality (`null` tests for NULL)
//! - an array of scalars: equality with any element
//! - an operator object with keys `eq`, `gte`, `lte`, `gt`, `lt`, `in`,
//!   `contains`, `like` and their `not-` prefixed negations
//!
//! Operators on one field and all fields combine with AND.

use crate::errors::DaoError;
use crate::query_builder::{sql_generation::bind, QueryFilter};
use crate::schema::{FieldDef, Schema};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

const NEGATION_PREFIX: &str = "not-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gte,
    Lte,
    Gt,
    Lt,
    In,
    Contains,
    Like,
}

impl Comparison {
    pub fn key(&self) -> &'static str {
        match self {
            Comparison::Eq => "eq",
            Comparison::Gte => "gte",
            Comparison::Lte => "lte",
            Comparison::Gt => "gt",
            Comparison::Lt => "lt",
            Comparison::In => "in",
            Comparison::Contains => "contains",
            Comparison::Like => "like",
        }
    }
}

impl FromStr for Comparison {
    type Err = DaoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Comparison::Eq),
            "gte" => Ok(Comparison::Gte),
            "lte" => Ok(Comparison::Lte),
            "gt" => Ok(Comparison::Gt),
            "lt" => Ok(Comparison::Lt),
            "in" => Ok(Comparison::In),
            "contains" => Ok(Comparison::Contains),
            "like" => Ok(Comparison::Like),
            other => Err(DaoError::argument(format!("Unknown filter operator '{}'", other))),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One operator of an operator object
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub comparison: Comparison,
    pub negated: bool,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    Equals(Value),
    AnyOf(Vec<Value>),
    Conditions(Vec<Condition>),
}

/// Ordered filter specification
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    entries: Vec<(String, FieldFilter)>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON form; `null` is the empty filter
    pub fn from_value(value: &Value) -> Result<Self, DaoError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => Self::from_map(map),
            other => Err(DaoError::argument(format!(
                "A filter must be an object keyed by field name, found {}",
                other
            ))),
        }
    }

    pub fn from_map(map: &Map<String, Value>) -> Result<Self, DaoError> {
        let entries = map
            .iter()
            .map(|(field, spec)| Ok((field.clone(), parse_field_filter(spec)?)))
            .collect::<Result<Vec<_>, DaoError>>()?;
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, FieldFilter)] {
        &self.entries
    }

    /// Equality (or IS NULL for `Value::Null`)
    pub fn equals(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.entries.push((field.to_string(), FieldFilter::Equals(value.into())));
        self
    }

    /// Equality with any of `values`
    pub fn any_of<V: Into<Value>>(mut self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.entries.push((field.to_string(), FieldFilter::AnyOf(values)));
        self
    }

    /// Add an operator condition on `field`
    pub fn with(self, field: &str, comparison: Comparison, value: impl Into<Value>) -> Self {
        self.push_condition(field, comparison, false, value.into())
    }

    /// Add a negated operator condition on `field`
    pub fn without(self, field: &str, comparison: Comparison, value: impl Into<Value>) -> Self {
        self.push_condition(field, comparison, true, value.into())
    }

    fn push_condition(mut self, field: &str, comparison: Comparison, negated: bool, value: Value) -> Self {
        let condition = Condition {
            comparison,
            negated,
            value,
        };
        let existing = self.entries.iter().position(|(name, filter)| {
            name == field && matches!(filter, FieldFilter::Conditions(_))
        });
        match existing {
            Some(index) => {
                if let FieldFilter::Conditions(conditions) = &mut self.entries[index].1 {
                    conditions.push(condition);
                }
            }
            None => self
                .entries
                .push((field.to_string(), FieldFilter::Conditions(vec![condition]))),
        }
        self
    }

    /// Translate into query filters, checking names and values against `schema`
    pub fn to_query_filters(&self, schema: &Schema) -> Result<Vec<QueryFilter>, DaoError> {
        let mut filters = Vec::new();

        for (name, filter) in &self.entries {
            let field = schema.field(name).ok_or_else(|| {
                DaoError::argument(format!("{} has no field named '{}'", schema.model, name))
            })?;

            match filter {
                FieldFilter::Equals(value) => {
                    check_value(field, value)?;
                    filters.push(QueryFilter::eq(field.name, value.clone()));
                }
                FieldFilter::AnyOf(values) => {
                    for value in values {
                        check_value(field, value)?;
                    }
                    filters.push(QueryFilter::or(
                        values
                            .iter()
                            .map(|value| QueryFilter::eq(field.name, value.clone()))
                            .collect(),
                    ));
                }
                FieldFilter::Conditions(conditions) => {
                    for condition in conditions {
                        filters.push(translate_condition(field, condition)?);
                    }
                }
            }
        }

        Ok(filters)
    }
}

fn parse_field_filter(spec: &Value) -> Result<FieldFilter, DaoError> {
    match spec {
        Value::Array(values) => Ok(FieldFilter::AnyOf(values.clone())),
        Value::Object(operators) => {
            let conditions = operators
                .iter()
                .map(|(key, value)| {
                    let (negated, op) = match key.strip_prefix(NEGATION_PREFIX) {
                        Some(op) => (true, op),
                        None => (false, key.as_str()),
                    };
                    Ok(Condition {
                        comparison: op.parse()?,
                        negated,
                        value: value.clone(),
                    })
                })
                .collect::<Result<Vec<_>, DaoError>>()?;
            Ok(FieldFilter::Conditions(conditions))
        }
        scalar => Ok(FieldFilter::Equals(scalar.clone())),
    }
}

fn translate_condition(field: &FieldDef, condition: &Condition) -> Result<QueryFilter, DaoError> {
    let name = field.name;
    let value = &condition.value;

    let filter = match condition.comparison {
        Comparison::Eq => {
            check_value(field, value)?;
            if condition.negated {
                return Ok(QueryFilter::ne(name, value.clone()));
            }
            QueryFilter::eq(name, value.clone())
        }
        Comparison::Gte => {
            check_value(field, value)?;
            QueryFilter::gte(name, value.clone())
        }
        Comparison::Lte => {
            check_value(field, value)?;
            QueryFilter::lte(name, value.clone())
        }
        Comparison::Gt => {
            check_value(field, value)?;
            QueryFilter::gt(name, value.clone())
        }
        Comparison::Lt => {
            check_value(field, value)?;
            QueryFilter::lt(name, value.clone())
        }
        Comparison::In => {
            let values = value.as_array().ok_or_else(|| {
                DaoError::argument(format!("The 'in' operator on '{}' expects a list", name))
            })?;
            for value in values {
                check_value(field, value)?;
            }
            if condition.negated {
                return Ok(QueryFilter::not_in_values(name, values.clone()));
            }
            QueryFilter::in_values(name, values.clone())
        }
        Comparison::Contains => QueryFilter::contains(name, &pattern(field, condition)?),
        Comparison::Like => QueryFilter::like(name, &pattern(field, condition)?),
    };

    Ok(if condition.negated {
        QueryFilter::not(filter)
    } else {
        filter
    })
}

fn pattern(field: &FieldDef, condition: &Condition) -> Result<String, DaoError> {
    match &condition.value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(DaoError::argument(format!(
            "The '{}' operator on '{}' expects text, found {}",
            condition.comparison, field.name, other
        ))),
    }
}

fn check_value(field: &FieldDef, value: &Value) -> Result<(), DaoError> {
    bind(field, value)
        .map(|_| ())
        .map_err(|e| DaoError::argument(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures::persons;
    use serde_json::json;

    #[test]
    fn parses_the_three_shapes() {
        let spec = FilterSpec::from_value(&json!({
            "name": "Ada",
            "tax_id": [1, 2],
            "birth_date": {"gte": "1990-01-01", "not-eq": "1995-05-05"}
        }))
        .unwrap();

        assert_eq!(spec.entries()[0], ("name".to_string(), FieldFilter::Equals(json!("Ada"))));
        assert_eq!(
            spec.entries()[1],
            ("tax_id".to_string(), FieldFilter::AnyOf(vec![json!(1), json!(2)]))
        );
        match &spec.entries()[2].1 {
            FieldFilter::Conditions(conditions) => {
                assert_eq!(conditions.len(), 2);
                assert_eq!(conditions[1].comparison, Comparison::Eq);
                assert!(conditions[1].negated);
            }
            other => panic!("unexpected filter {:?}", other),
        }
    }

    #[test]
    fn unknown_operator_is_an_argument_error() {
        let err = FilterSpec::from_value(&json!({"name": {"between": [1, 2]}})).unwrap_err();
        assert_eq!(err, DaoError::Argument("Unknown filter operator 'between'".to_string()));
    }

    #[test]
    fn every_operator_on_a_field_is_kept() {
        let spec = FilterSpec::new()
            .with("name", Comparison::Like, "P%")
            .without("name", Comparison::Like, "%9")
            .without("name", Comparison::Contains, "1");
        let filters = spec.to_query_filters(persons()).unwrap();
        assert_eq!(
            filters,
            vec![
                QueryFilter::like("name", "P%"),
                QueryFilter::not(QueryFilter::like("name", "%9")),
                QueryFilter::not(QueryFilter::contains("name", "1")),
            ]
        );
    }

    #[test]
    fn negated_equality_and_membership_use_their_own_operators() {
        let spec = FilterSpec::from_value(&json!({
            "name": {"not-eq": "Ada", "not-in": ["Bob", "Eve"]},
            "nickname": {"not-eq": null}
        }))
        .unwrap();
        let filters = spec.to_query_filters(persons()).unwrap();
        assert_eq!(
            filters,
            vec![
                QueryFilter::ne("name", json!("Ada")),
                QueryFilter::not_in_values("name", vec![json!("Bob"), json!("Eve")]),
                QueryFilter::is_not_null("nickname"),
            ]
        );
    }

    #[test]
    fn array_becomes_or_of_equalities() {
        let spec = FilterSpec::new().any_of("tax_id", [1, 2]);
        let filters = spec.to_query_filters(persons()).unwrap();
        assert_eq!(
            filters,
            vec![QueryFilter::or(vec![
                QueryFilter::eq("tax_id", json!(1)),
                QueryFilter::eq("tax_id", json!(2)),
            ])]
        );
    }

    #[test]
    fn unknown_fields_and_bad_values_are_rejected() {
        let err = FilterSpec::new().equals("shoe_size", 42).to_query_filters(persons()).unwrap_err();
        assert_eq!(
            err,
            DaoError::Argument("PersonModel has no field named 'shoe_size'".to_string())
        );

        let err = FilterSpec::new()
            .with("birth_date", Comparison::Gte, "yesterday")
            .to_query_filters(persons())
            .unwrap_err();
        assert!(matches!(err, DaoError::Argument(_)));

        let err = FilterSpec::new()
            .with("tax_id", Comparison::In, 3)
            .to_query_filters(persons())
            .unwrap_err();
        assert!(matches!(err, DaoError::Argument(ref msg) if msg.contains("expects a list")));
    }

    #[test]
    fn null_scalar_means_is_null() {
        let spec = FilterSpec::from_value(&json!({"nickname": null})).unwrap();
        let filters = spec.to_query_filters(persons()).unwrap();
        assert_eq!(filters, vec![QueryFilter::is_null("nickname")]);
    }
}
