//! Type mapping definitions
//!
//! `FieldKind` classifies a model column, `SqlValue` is a typed value ready to
//! be bound into a statement for any supported dialect.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Storage class of a model column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Integer,
    Float,
    Text,
    Bool,
    Date,
    DateTime,
    Uuid,
    /// Unit-variant enum stored as its variant name
    Enum,
    Json,
}

impl FieldKind {
    /// Variant name used by generated code (`FieldKind::<name>`)
    pub fn variant_name(&self) -> &'static str {
        match self {
            FieldKind::Integer => "Integer",
            FieldKind::Float => "Float",
            FieldKind::Text => "Text",
            FieldKind::Bool => "Bool",
            FieldKind::Date => "Date",
            FieldKind::DateTime => "DateTime",
            FieldKind::Uuid => "Uuid",
            FieldKind::Enum => "Enum",
            FieldKind::Json => "Json",
        }
    }

    /// Kinds whose values can be compared with `LIKE`
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::Enum)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.variant_name().to_lowercase())
    }
}

/// Typed SQL parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL keeps the column kind so that binders can pick a typed null
    Null(FieldKind),
    Integer(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
    Json(serde_json::Value),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null(_))
    }

    /// Kind of the column this value belongs to
    pub fn kind(&self) -> FieldKind {
        match self {
            SqlValue::Null(kind) => *kind,
            SqlValue::Integer(_) => FieldKind::Integer,
            SqlValue::Float(_) => FieldKind::Float,
            SqlValue::Text(_) => FieldKind::Text,
            SqlValue::Bool(_) => FieldKind::Bool,
            SqlValue::Date(_) => FieldKind::Date,
            SqlValue::DateTime(_) => FieldKind::DateTime,
            SqlValue::Uuid(_) => FieldKind::Uuid,
            SqlValue::Json(_) => FieldKind::Json,
        }
    }

    /// JSON rendering of the value, matching what serde produces for the
    /// corresponding Rust field type
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            SqlValue::Null(_) => Value::Null,
            SqlValue::Integer(i) => Value::from(*i),
            SqlValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            SqlValue::Text(s) => Value::String(s.clone()),
            SqlValue::Bool(b) => Value::Bool(*b),
            SqlValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            SqlValue::DateTime(dt) => serde_json::to_value(dt).unwrap_or(Value::Null),
            SqlValue::Uuid(u) => Value::String(u.to_string()),
            SqlValue::Json(v) => v.clone(),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null(_) => f.write_str("NULL"),
            SqlValue::Integer(i) => write!(f, "{}", i),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Text(s) => f.write_str(s),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            SqlValue::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
            SqlValue::Uuid(u) => write!(f, "{}", u),
            SqlValue::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<String> for SqlValue {
    fn from(val: String) -> Self {
        SqlValue::Text(val)
    }
}

impl From<&str> for SqlValue {
    fn from(val: &str) -> Self {
        SqlValue::Text(val.to_string())
    }
}

impl From<i64> for SqlValue {
    fn from(val: i64) -> Self {
        SqlValue::Integer(val)
    }
}

impl From<i32> for SqlValue {
    fn from(val: i32) -> Self {
        SqlValue::Integer(val as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(val: f64) -> Self {
        SqlValue::Float(val)
    }
}

impl From<bool> for SqlValue {
    fn from(val: bool) -> Self {
        SqlValue::Bool(val)
    }
}

impl From<Uuid> for SqlValue {
    fn from(val: Uuid) -> Self {
        SqlValue::Uuid(val)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(val: NaiveDate) -> Self {
        SqlValue::Date(val)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(val: DateTime<Utc>) -> Self {
        SqlValue::DateTime(val)
    }
}
