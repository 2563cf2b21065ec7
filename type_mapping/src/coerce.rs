//! JSON to SQL value coercion
//!
//! Payloads arrive as `serde_json::Value`s. Each value is checked against the
//! kind of the column it targets and turned into a bindable `SqlValue`.

use crate::types::{FieldKind, SqlValue};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::fmt;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// A value that cannot be stored in a column of the given kind
#[derive(Debug, Clone, PartialEq)]
pub struct CoercionError {
    pub expected: FieldKind,
    pub found: String,
}

impl CoercionError {
    fn new(expected: FieldKind, found: &Value) -> Self {
        Self {
            expected,
            found: found.to_string(),
        }
    }
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected a {} value, found {}", self.expected, self.found)
    }
}

impl std::error::Error for CoercionError {}

/// Coerce a JSON value into a typed SQL value for a column of `kind`
pub fn coerce(kind: FieldKind, value: &Value) -> Result<SqlValue, CoercionError> {
    if value.is_null() {
        return Ok(SqlValue::Null(kind));
    }

    let coerced = match kind {
        FieldKind::Integer => coerce_integer(value),
        FieldKind::Float => match value {
            Value::Number(n) => n.as_f64().map(SqlValue::Float),
            Value::String(s) => s.trim().parse::<f64>().ok().map(SqlValue::Float),
            _ => None,
        },
        FieldKind::Text | FieldKind::Enum => value.as_str().map(|s| SqlValue::Text(s.to_string())),
        FieldKind::Bool => match value {
            Value::Bool(b) => Some(SqlValue::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(SqlValue::Bool(false)),
                Some(1) => Some(SqlValue::Bool(true)),
                _ => None,
            },
            _ => None,
        },
        FieldKind::Date => value.as_str().and_then(parse_date).map(SqlValue::Date),
        FieldKind::DateTime => value.as_str().and_then(parse_datetime).map(SqlValue::DateTime),
        FieldKind::Uuid => value
            .as_str()
            .and_then(|s| uuid::Uuid::parse_str(s).ok())
            .map(SqlValue::Uuid),
        FieldKind::Json => Some(SqlValue::Json(value.clone())),
    };

    coerced.ok_or_else(|| CoercionError::new(kind, value))
}

fn coerce_integer(value: &Value) -> Option<SqlValue> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(SqlValue::Integer),
        Value::String(s) => s.trim().parse::<i64>().ok().map(SqlValue::Integer),
        _ => None,
    }
}

/// Parse a calendar date, accepting a full timestamp as well
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(raw).map(|dt| dt.date_naive()))
}

/// Parse a timestamp; timestamps without an offset are taken as UTC
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}
