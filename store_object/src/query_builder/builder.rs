//! Query builder
//!
//! Built by the access object from filter, order and join specifications;
//! executed by a `StoreSession`.

use crate::criteria::JoinSpec;
use crate::query_builder::filter::QueryFilter;
use crate::query_builder::ordering::SortOrder;

/// Query builder for constructing database queries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    pub(crate) conditions: Vec<QueryFilter>,
    pub(crate) order_by: Vec<(String, SortOrder)>,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
    pub(crate) joins: JoinSpec,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter condition
    pub fn filter(mut self, filter: QueryFilter) -> Self {
        self.conditions.push(filter);
        self
    }

    /// Add multiple filters (combined with AND)
    pub fn filters(mut self, filters: Vec<QueryFilter>) -> Self {
        self.conditions.extend(filters);
        self
    }

    /// Add ordering; successive calls add tie-breakers
    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order_by.push((field.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Request eager loading of relations
    pub fn joins(mut self, joins: JoinSpec) -> Self {
        self.joins.extend(joins);
        self
    }

    pub fn conditions(&self) -> &[QueryFilter] {
        &self.conditions
    }

    pub fn ordering(&self) -> &[(String, SortOrder)] {
        &self.order_by
    }

    pub fn limit_value(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<i64> {
        self.offset
    }

    pub fn join_spec(&self) -> &JoinSpec {
        &self.joins
    }

    /// Same query restricted to one window of results
    pub fn window(&self, limit: i64, offset: i64) -> Self {
        let mut query = self.clone();
        query.limit = Some(limit);
        query.offset = Some(offset);
        query
    }
}
