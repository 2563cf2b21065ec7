use super::relations::load_relations;
use crate::criteria::{FilterSpec, JoinSpec, OrderSpec, Selector};
use crate::errors::{DaoError, StoreError};
use crate::query_builder::{Page, Pagination, QueryBuilder, QueryFilter};
use crate::schema::Schema;
use crate::traits::record::Record;
use crate::traits::store::StoreSession;
use crate::Fields;
use serde_json::Value;
use std::marker::PhantomData;

pub(super) const READING: &str = "reading";

/// Data access object for records of type `T`
pub struct Dao<T: Record, S: StoreSession> {
    pub(super) session: S,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record, S: StoreSession> std::fmt::Debug for Dao<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dao")
            .field("model", &T::schema().model)
            .field("table", &T::schema().table)
            .finish()
    }
}

impl<T: Record, S: StoreSession> Dao<T, S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            _record: PhantomData,
        }
    }

    pub(super) fn schema() -> &'static Schema {
        T::schema()
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Release the session without closing the unit of work
    pub fn into_session(self) -> S {
        self.session
    }

    pub async fn commit(self) -> Result<(), DaoError> {
        self.session
            .commit()
            .await
            .map_err(|e| DaoError::persistence(T::schema().model, "committing", e))
    }

    pub async fn rollback(self) -> Result<(), DaoError> {
        self.session
            .rollback()
            .await
            .map_err(|e| DaoError::persistence(T::schema().model, "rolling back", e))
    }

    /// First record matching `selector`, with `joins` loaded
    pub async fn get(&mut self, selector: &Selector, joins: &JoinSpec) -> Result<Option<T>, DaoError> {
        let schema = Self::schema();
        joins.resolve(schema)?;
        let query = QueryBuilder::new()
            .filters(selector.to_filters(schema)?)
            .joins(joins.clone())
            .limit(1);
        Ok(self.fetch(&query).await?.into_iter().next())
    }

    /// Compose a query from filter, join and order specifications
    ///
    /// Nothing is executed; run the result with `fetch`, `count` or `paginate`.
    pub fn list(
        &self,
        filter: &FilterSpec,
        order: &OrderSpec,
        joins: &JoinSpec,
    ) -> Result<QueryBuilder, DaoError> {
        let schema = Self::schema();
        let query = QueryBuilder::new().filters(filter.to_query_filters(schema)?);
        joins.resolve(schema)?;
        order.apply(schema, query.joins(joins.clone()))
    }

    /// Execute `query` and decode the matching records
    pub async fn fetch(&mut self, query: &QueryBuilder) -> Result<Vec<T>, DaoError> {
        let rows = self.fetch_rows(query).await?;
        rows.into_iter().map(decode::<T>).collect()
    }

    /// Execute `query` and return the raw field mappings, relations attached
    pub async fn fetch_rows(&mut self, query: &QueryBuilder) -> Result<Vec<Fields>, DaoError> {
        let schema = Self::schema();
        let joins = query.join_spec().resolve(schema)?;
        let mut rows = self
            .session
            .fetch(schema, query)
            .await
            .map_err(|e| store_error::<T>(READING, e, None))?;
        load_relations(&mut self.session, schema, &mut rows, &joins)
            .await
            .map_err(|e| store_error::<T>(READING, e, None))?;
        Ok(rows)
    }

    /// Number of records matching `query`, ignoring order, limit and offset
    pub async fn count(&mut self, query: &QueryBuilder) -> Result<i64, DaoError> {
        self.session
            .count(Self::schema(), query)
            .await
            .map_err(|e| store_error::<T>(READING, e, None))
    }

    /// One page of `query`
    pub async fn paginate(
        &mut self,
        query: &QueryBuilder,
        page: i64,
        per_page: i64,
    ) -> Result<Page<T>, DaoError> {
        let pagination = Pagination::new(page, per_page).map_err(DaoError::Argument)?;
        let records = self
            .fetch(&query.window(pagination.limit(), pagination.offset()))
            .await?;
        let total = self.count(query).await?;
        crate::debug_log!(
            "{} page {} of {} ({} total)",
            Self::schema().model,
            pagination.page,
            pagination.per_page,
            total
        );
        Ok(Page::new(records, pagination, total))
    }

    /// Conditions selecting every record matched by `selector`
    ///
    /// Fails with `NotFound` when nothing matches.
    pub(super) async fn matching_filters(
        &mut self,
        selector: &Selector,
        action: &'static str,
    ) -> Result<Vec<QueryFilter>, DaoError> {
        let schema = Self::schema();
        let filters = selector.to_filters(schema)?;
        let matches = self
            .session
            .count(schema, &QueryBuilder::new().filters(filters.clone()))
            .await
            .map_err(|e| store_error::<T>(action, e, None))?;

        if matches == 0 {
            return Err(DaoError::NotFound {
                model: schema.model,
                selector: selector.to_string(),
            });
        }
        Ok(filters)
    }
}

fn decode<T: Record>(fields: Fields) -> Result<T, DaoError> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| DaoError::persistence(T::schema().model, READING, e))
}

/// Map a store failure to the caller-facing taxonomy
///
/// `payload` supplies the offending values of a uniqueness violation.
pub(super) fn store_error<T: Record>(
    action: &'static str,
    err: StoreError,
    payload: Option<&Fields>,
) -> DaoError {
    let model = T::schema().model;
    match err {
        StoreError::UniqueViolation {
            columns, message, ..
        } => {
            let values = columns
                .iter()
                .map(|column| {
                    payload
                        .and_then(|payload| payload.get(column))
                        .map(render_value)
                        .unwrap_or_else(|| "?".to_string())
                })
                .collect();
            DaoError::DuplicateKey {
                model,
                action,
                columns,
                values,
                detail: message,
            }
        }
        StoreError::InvalidValue { .. } | StoreError::UnknownField { .. } => {
            DaoError::Argument(err.to_string())
        }
        StoreError::Database(message) => DaoError::Persistence {
            model,
            action,
            message,
        },
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
