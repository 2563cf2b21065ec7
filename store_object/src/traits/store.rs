//! Record store boundary
//!
//! The access object only talks to a `StoreSession`: one unit of work over
//! one database transaction. Rows travel as JSON field mappings keyed by
//! column name; values headed for the database are already typed.

use crate::errors::StoreError;
use crate::id_type::RecordId;
use crate::query_builder::{QueryBuilder, QueryFilter};
use crate::schema::Schema;
use crate::Fields;
use async_trait::async_trait;
use type_mapping::SqlValue;

/// Column/value pairs of an insert or update
pub type Assignments = Vec<(&'static str, SqlValue)>;

/// Opens units of work
#[async_trait]
pub trait RecordStore: Send + Sync {
    type Session: StoreSession;

    async fn begin(&self) -> Result<Self::Session, StoreError>;
}

/// One unit of work
#[async_trait]
pub trait StoreSession: Send + Sized {
    /// Rows matching the query's conditions, ordering, limit and offset
    async fn fetch(
        &mut self,
        schema: &'static Schema,
        query: &QueryBuilder,
    ) -> Result<Vec<Fields>, StoreError>;

    /// Number of rows matching the query's conditions
    async fn count(&mut self, schema: &'static Schema, query: &QueryBuilder)
        -> Result<i64, StoreError>;

    /// Insert one row and report its primary key
    async fn insert(
        &mut self,
        schema: &'static Schema,
        values: Assignments,
    ) -> Result<RecordId, StoreError>;

    /// Apply `changes` to every row matching `conditions`
    async fn update(
        &mut self,
        schema: &'static Schema,
        conditions: &[QueryFilter],
        changes: Assignments,
    ) -> Result<u64, StoreError>;

    /// Remove every row matching `conditions`
    async fn delete(
        &mut self,
        schema: &'static Schema,
        conditions: &[QueryFilter],
    ) -> Result<u64, StoreError>;

    /// Most values one `IN` list may carry on this store
    fn max_in_list(&self) -> usize;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
