//! Record identifiers
//!
//! Primary keys are either store-generated integers or UUIDs.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt::{self, Display};
use type_mapping::{FieldKind, SqlValue};
use uuid::Uuid;

/// Identifier of a persisted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordId {
    Numeric(i64),
    Uuid(Uuid),
}

impl RecordId {
    /// Read an identifier out of a decoded column value
    pub fn from_value(kind: FieldKind, value: &Value) -> Option<Self> {
        match (kind, value) {
            (FieldKind::Integer, Value::Number(n)) => n.as_i64().map(RecordId::Numeric),
            (FieldKind::Uuid, Value::String(s)) => Uuid::parse_str(s).ok().map(RecordId::Uuid),
            _ => None,
        }
    }

    pub fn to_sql_value(&self) -> SqlValue {
        match self {
            RecordId::Numeric(n) => SqlValue::Integer(*n),
            RecordId::Uuid(uuid) => SqlValue::Uuid(*uuid),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            RecordId::Numeric(n) => Value::from(*n),
            RecordId::Uuid(uuid) => Value::String(uuid.to_string()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RecordId::Numeric(n) => Some(*n),
            RecordId::Uuid(_) => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            RecordId::Uuid(uuid) => Some(*uuid),
            RecordId::Numeric(_) => None,
        }
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Numeric(n) => write!(f, "{}", n),
            RecordId::Uuid(uuid) => write!(f, "{}", uuid),
        }
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecordId::Numeric(n) => serializer.serialize_i64(*n),
            RecordId::Uuid(uuid) => uuid.serialize(serializer),
        }
    }
}

impl From<RecordId> for Value {
    fn from(id: RecordId) -> Self {
        id.to_json()
    }
}

impl From<i32> for RecordId {
    fn from(id: i32) -> Self {
        RecordId::Numeric(id as i64)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Numeric(id)
    }
}

impl From<Uuid> for RecordId {
    fn from(id: Uuid) -> Self {
        RecordId::Uuid(id)
    }
}

/// Trait for primary key field types
pub trait HasRecordId {
    fn record_id(&self) -> RecordId;
}

impl HasRecordId for i32 {
    fn record_id(&self) -> RecordId {
        RecordId::Numeric(*self as i64)
    }
}

impl HasRecordId for i64 {
    fn record_id(&self) -> RecordId {
        RecordId::Numeric(*self)
    }
}

impl HasRecordId for u32 {
    fn record_id(&self) -> RecordId {
        RecordId::Numeric(*self as i64)
    }
}

impl HasRecordId for Uuid {
    fn record_id(&self) -> RecordId {
        RecordId::Uuid(*self)
    }
}
