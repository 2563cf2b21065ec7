//! Parameter binding and row decoding
//!
//! sqlx encodes and decodes per concrete database, so both directions are
//! written as macros and expanded once for every supported backend.

use crate::errors::StoreError;
use crate::schema::{FieldDef, Schema};
use crate::Fields;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use sqlx::Row;
use type_mapping::FieldKind;
use uuid::Uuid;

/// Bind one `SqlValue`, choosing a typed NULL from the column kind
macro_rules! bind_sql_value {
    ($query:expr, $value:expr) => {
        match $value {
            type_mapping::SqlValue::Null(kind) => match kind {
                type_mapping::FieldKind::Integer => $query.bind(Option::<i64>::None),
                type_mapping::FieldKind::Float => $query.bind(Option::<f64>::None),
                type_mapping::FieldKind::Text | type_mapping::FieldKind::Enum => {
                    $query.bind(Option::<String>::None)
                }
                type_mapping::FieldKind::Bool => $query.bind(Option::<bool>::None),
                type_mapping::FieldKind::Date => $query.bind(Option::<chrono::NaiveDate>::None),
                type_mapping::FieldKind::DateTime => {
                    $query.bind(Option::<chrono::DateTime<chrono::Utc>>::None)
                }
                type_mapping::FieldKind::Uuid => $query.bind(Option::<uuid::Uuid>::None),
                type_mapping::FieldKind::Json => {
                    $query.bind(Option::<sqlx::types::Json<serde_json::Value>>::None)
                }
            },
            type_mapping::SqlValue::Integer(v) => $query.bind(v),
            type_mapping::SqlValue::Float(v) => $query.bind(v),
            type_mapping::SqlValue::Text(v) => $query.bind(v),
            type_mapping::SqlValue::Bool(v) => $query.bind(v),
            type_mapping::SqlValue::Date(v) => $query.bind(v),
            type_mapping::SqlValue::DateTime(v) => $query.bind(v),
            type_mapping::SqlValue::Uuid(v) => $query.bind(v),
            type_mapping::SqlValue::Json(v) => $query.bind(sqlx::types::Json(v)),
        }
    };
}

/// Bind every parameter of a `Statement`, in order
macro_rules! bind_all {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for param in $params {
            query = bind_sql_value!(query, param);
        }
        query
    }};
}

pub(crate) use bind_all;
pub(crate) use bind_sql_value;

/// Decode a row into a field mapping following the schema
pub(crate) trait DecodeRow {
    fn decode_fields(&self, schema: &Schema) -> Result<Fields, StoreError>;

    fn decode_count(&self) -> Result<i64, StoreError>;
}

fn decode_error(schema: &Schema, field: &FieldDef, err: sqlx::Error) -> StoreError {
    StoreError::Database(format!(
        "could not decode {}.{} as {}: {}",
        schema.table, field.name, field.kind, err
    ))
}

macro_rules! impl_row_decoder {
    ($row:ty) => {
        impl DecodeRow for $row {
            fn decode_fields(&self, schema: &Schema) -> Result<Fields, StoreError> {
                let mut fields = Fields::new();

                for field in &schema.fields {
                    let name = field.name;
                    let decoded: Result<Option<Value>, sqlx::Error> = match field.kind {
                        FieldKind::Integer => self
                            .try_get::<Option<i64>, _>(name)
                            .or_else(|_| {
                                self.try_get::<Option<i32>, _>(name)
                                    .map(|v| v.map(i64::from))
                            })
                            .map(|v| v.map(Value::from)),
                        FieldKind::Float => self
                            .try_get::<Option<f64>, _>(name)
                            .or_else(|_| {
                                self.try_get::<Option<f32>, _>(name)
                                    .map(|v| v.map(f64::from))
                            })
                            .map(|v| v.map(Value::from)),
                        FieldKind::Text | FieldKind::Enum => self
                            .try_get::<Option<String>, _>(name)
                            .map(|v| v.map(Value::String)),
                        FieldKind::Bool => self
                            .try_get::<Option<bool>, _>(name)
                            .map(|v| v.map(Value::Bool)),
                        FieldKind::Date => self
                            .try_get::<Option<NaiveDate>, _>(name)
                            .map(|v| v.map(|d| Value::String(d.format("%Y-%m-%d").to_string()))),
                        FieldKind::DateTime => self
                            .try_get::<Option<DateTime<Utc>>, _>(name)
                            .or_else(|_| {
                                self.try_get::<Option<NaiveDateTime>, _>(name)
                                    .map(|v| v.map(|naive| naive.and_utc()))
                            })
                            .map(|v| v.map(|dt| Value::String(dt.to_rfc3339()))),
                        FieldKind::Uuid => self
                            .try_get::<Option<Uuid>, _>(name)
                            .map(|v| v.map(|u| Value::String(u.to_string())))
                            .or_else(|_| {
                                self.try_get::<Option<String>, _>(name)
                                    .map(|v| v.map(Value::String))
                            }),
                        FieldKind::Json => self
                            .try_get::<Option<sqlx::types::Json<Value>>, _>(name)
                            .map(|v| v.map(|json| json.0))
                            .or_else(|_| {
                                self.try_get::<Option<String>, _>(name).and_then(|v| {
                                    v.map(|raw| {
                                        serde_json::from_str::<Value>(&raw)
                                            .map_err(|e| sqlx::Error::Decode(Box::new(e)))
                                    })
                                    .transpose()
                                })
                            }),
                    };

                    let value = decoded.map_err(|e| decode_error(schema, field, e))?;
                    fields.insert(name.to_string(), value.unwrap_or(Value::Null));
                }

                Ok(fields)
            }

            fn decode_count(&self) -> Result<i64, StoreError> {
                self.try_get::<i64, _>(0)
                    .or_else(|_| self.try_get::<i32, _>(0).map(i64::from))
                    .map_err(|e| StoreError::Database(e.to_string()))
            }
        }
    };
}

impl_row_decoder!(sqlx::postgres::PgRow);
impl_row_decoder!(sqlx::mysql::MySqlRow);
impl_row_decoder!(sqlx::sqlite::SqliteRow);
