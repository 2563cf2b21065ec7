//! Store Object - data access layer for recordhaus
//!
//! Record and store traits, the per-type field registry, declarative criteria,
//! the query builder with its SQL generator, the sqlx-backed record store and
//! the `Dao` access object that ties them together.

extern crate self as store_object;

/// Conditional logging macros; they compile to nothing unless the
/// `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub(crate) use debug_log;
pub(crate) use trace_log;

pub mod criteria;
pub mod dao;
pub mod errors;
pub mod id_type;
pub mod prelude;
pub mod query_builder;
pub mod schema;
pub mod serialization;
pub mod sql_store;
pub mod traits;

/// A record or row as a JSON object keyed by field name
pub type Fields = serde_json::Map<String, serde_json::Value>;

pub use criteria::{Comparison, FilterSpec, Join, JoinSpec, OrderSpec, Selector};
pub use dao::Dao;
pub use errors::{DaoError, StoreError};
pub use id_type::{HasRecordId, RecordId};
pub use query_builder::{
    Dialect, Page, Pagination, QueryBuilder, QueryFilter, QueryOperator, SortOrder, SqlGenerator,
    Statement, DEFAULT_PAGE, DEFAULT_PER_PAGE,
};
pub use schema::{FieldDef, RelationDef, RelationKind, Schema};
pub use sql_store::{DbPool, SqlSession, SqlStore};
pub use traits::*;
pub use type_mapping::{coerce, FieldKind, SqlValue};

// Used by code generated from `#[model]` and `#[derive(Record)]`
pub use chrono;
pub use serde;
pub use serde_json;
pub use type_mapping;
pub use uuid;
