//! Convenience re-exports for common store-object usage

// Core traits
pub use crate::traits::{Record, RecordStore, StoreSession};

// Error types
pub use crate::errors::{DaoError, StoreError};

// Access object and the shipped store
pub use crate::dao::Dao;
pub use crate::sql_store::{DbPool, SqlStore};

pub use crate::id_type::{HasRecordId, RecordId};

// Criteria and query building
pub use crate::criteria::{Comparison, FilterSpec, Join, JoinSpec, OrderSpec, Selector};
pub use crate::query_builder::{Dialect, Page, QueryBuilder, QueryFilter, SortOrder};

pub use crate::Fields;

// Common external dependencies that are frequently used
pub use chrono::{DateTime, NaiveDate, Utc};
pub use serde::{Deserialize, Serialize};
pub use serde_json::{json, Value};
pub use uuid::Uuid;
