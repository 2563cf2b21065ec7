//! SQL session
//!
//! One `SqlSession` wraps one open database transaction. Statements are
//! rendered by `SqlGenerator` for the session's dialect.

use super::binding::{bind_all, bind_sql_value, DecodeRow};
use crate::errors::StoreError;
use crate::id_type::RecordId;
use crate::query_builder::{Dialect, QueryBuilder, QueryFilter, SqlGenerator, Statement};
use crate::schema::Schema;
use crate::traits::store::{Assignments, StoreSession};
use crate::Fields;
use async_trait::async_trait;
use sqlx::{MySql, Postgres, Row, Sqlite, Transaction};
use type_mapping::{FieldKind, SqlValue};
use uuid::Uuid;

/// Open unit of work on one of the supported backends
#[derive(Debug)]
pub enum SqlSession {
    Postgres(Transaction<'static, Postgres>),
    MySql(Transaction<'static, MySql>),
    Sqlite(Transaction<'static, Sqlite>),
}

/// Run `$body` with `$tx` bound to the open transaction and `$db` naming its
/// database type, whatever the backend
macro_rules! with_transaction {
    ($session:expr, $tx:ident => $body:expr) => {
        match $session {
            SqlSession::Postgres($tx) => $body,
            SqlSession::MySql($tx) => $body,
            SqlSession::Sqlite($tx) => $body,
        }
    };
    ($session:expr, $tx:ident, $db:ident => $body:expr) => {
        match $session {
            SqlSession::Postgres($tx) => {
                type $db = Postgres;
                $body
            }
            SqlSession::MySql($tx) => {
                type $db = MySql;
                $body
            }
            SqlSession::Sqlite($tx) => {
                type $db = Sqlite;
                $body
            }
        }
    };
}

impl SqlSession {
    pub fn dialect(&self) -> Dialect {
        match self {
            SqlSession::Postgres(_) => Dialect::Postgres,
            SqlSession::MySql(_) => Dialect::MySql,
            SqlSession::Sqlite(_) => Dialect::Sqlite,
        }
    }

    fn generator(&self) -> SqlGenerator {
        SqlGenerator::new(self.dialect())
    }

    /// Execute a statement that returns no rows
    async fn execute(&mut self, schema: &Schema, statement: Statement) -> Result<u64, StoreError> {
        log_statement(&statement);
        let Statement { sql, params } = statement;
        with_transaction!(self, tx, Db => {
            bind_all!(sqlx::query::<Db>(&sql), params)
                .execute(&mut **tx)
                .await
                .map(|result| result.rows_affected())
                .map_err(|e| map_sqlx_error(schema, e))
        })
    }
}

#[async_trait]
impl StoreSession for SqlSession {
    async fn fetch(
        &mut self,
        schema: &'static Schema,
        query: &QueryBuilder,
    ) -> Result<Vec<Fields>, StoreError> {
        let statement = self.generator().select(schema, query)?;
        log_statement(&statement);
        let Statement { sql, params } = statement;

        with_transaction!(self, tx, Db => {
            let rows = bind_all!(sqlx::query::<Db>(&sql), params)
                .fetch_all(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error(schema, e))?;
            rows.iter().map(|row| row.decode_fields(schema)).collect()
        })
    }

    async fn count(
        &mut self,
        schema: &'static Schema,
        query: &QueryBuilder,
    ) -> Result<i64, StoreError> {
        let statement = self.generator().count(schema, query)?;
        log_statement(&statement);
        let Statement { sql, params } = statement;

        with_transaction!(self, tx, Db => {
            let row = bind_all!(sqlx::query::<Db>(&sql), params)
                .fetch_one(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error(schema, e))?;
            row.decode_count()
        })
    }

    async fn insert(
        &mut self,
        schema: &'static Schema,
        values: Assignments,
    ) -> Result<RecordId, StoreError> {
        let primary_key = schema.primary_key_field()?;
        let supplied = values
            .iter()
            .find(|(column, value)| *column == primary_key.name && !value.is_null())
            .map(|(_, value)| value.clone());

        if let Some(id) = supplied {
            let statement = self.generator().insert(schema, &values, None)?;
            self.execute(schema, statement).await?;
            return record_id_from_sql(&id);
        }

        match self {
            SqlSession::Postgres(tx) => {
                let statement = SqlGenerator::new(Dialect::Postgres).insert(
                    schema,
                    &values,
                    Some(primary_key.name),
                )?;
                log_statement(&statement);
                let Statement { sql, params } = statement;
                let row = bind_all!(sqlx::query::<Postgres>(&sql), params)
                    .fetch_one(&mut **tx)
                    .await
                    .map_err(|e| map_sqlx_error(schema, e))?;
                let id = match primary_key.kind {
                    FieldKind::Uuid => row.try_get::<Uuid, _>(0).map(RecordId::Uuid),
                    _ => row
                        .try_get::<i64, _>(0)
                        .or_else(|_| row.try_get::<i32, _>(0).map(i64::from))
                        .map(RecordId::Numeric),
                };
                id.map_err(|e| StoreError::Database(e.to_string()))
            }
            SqlSession::MySql(tx) => {
                let statement = SqlGenerator::new(Dialect::MySql).insert(schema, &values, None)?;
                log_statement(&statement);
                let Statement { sql, params } = statement;
                let result = bind_all!(sqlx::query::<MySql>(&sql), params)
                    .execute(&mut **tx)
                    .await
                    .map_err(|e| map_sqlx_error(schema, e))?;
                Ok(RecordId::Numeric(result.last_insert_id() as i64))
            }
            SqlSession::Sqlite(tx) => {
                let statement = SqlGenerator::new(Dialect::Sqlite).insert(schema, &values, None)?;
                log_statement(&statement);
                let Statement { sql, params } = statement;
                let result = bind_all!(sqlx::query::<Sqlite>(&sql), params)
                    .execute(&mut **tx)
                    .await
                    .map_err(|e| map_sqlx_error(schema, e))?;
                Ok(RecordId::Numeric(result.last_insert_rowid()))
            }
        }
    }

    async fn update(
        &mut self,
        schema: &'static Schema,
        conditions: &[QueryFilter],
        changes: Assignments,
    ) -> Result<u64, StoreError> {
        let statement = self.generator().update(schema, conditions, &changes)?;
        self.execute(schema, statement).await
    }

    async fn delete(
        &mut self,
        schema: &'static Schema,
        conditions: &[QueryFilter],
    ) -> Result<u64, StoreError> {
        let statement = self.generator().delete(schema, conditions)?;
        self.execute(schema, statement).await
    }

    fn max_in_list(&self) -> usize {
        self.dialect().max_params()
    }

    async fn commit(self) -> Result<(), StoreError> {
        tracing::trace!(dialect = %self.dialect(), "committing transaction");
        with_transaction!(self, tx => tx.commit().await)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn rollback(self) -> Result<(), StoreError> {
        tracing::trace!(dialect = %self.dialect(), "rolling back transaction");
        with_transaction!(self, tx => tx.rollback().await)
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

fn log_statement(statement: &Statement) {
    tracing::debug!(sql = %statement.sql, params = statement.params.len(), "executing statement");
}

fn record_id_from_sql(value: &SqlValue) -> Result<RecordId, StoreError> {
    match value {
        SqlValue::Integer(id) => Ok(RecordId::Numeric(*id)),
        SqlValue::Uuid(id) => Ok(RecordId::Uuid(*id)),
        other => Err(StoreError::InvalidValue {
            field: "primary key".to_string(),
            reason: format!("{:?} cannot identify a record", other),
        }),
    }
}

/// Translate a driver error, recognising uniqueness violations
pub(crate) fn map_sqlx_error(schema: &Schema, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        let message = db.message().to_string();
        if db.is_unique_violation()
            || message.contains("UNIQUE constraint failed")
            || message.starts_with("Duplicate entry")
        {
            let constraint = db.constraint().map(str::to_string);
            let columns = violated_columns(schema, constraint.as_deref(), &message);
            return StoreError::UniqueViolation {
                constraint,
                columns,
                message,
            };
        }
    }
    StoreError::Database(err.to_string())
}

/// Columns named by a uniqueness violation
///
/// SQLite lists `table.column` pairs in the message, PostgreSQL reports the
/// constraint name and MySQL names the violated key in the message.
pub(crate) fn violated_columns(
    schema: &Schema,
    constraint: Option<&str>,
    message: &str,
) -> Vec<String> {
    if let Some((_, listed)) = message.split_once("constraint failed: ") {
        return listed
            .split(',')
            .filter_map(|part| part.trim().rsplit('.').next())
            .filter_map(|column| schema.field(column))
            .map(|field| field.name.to_string())
            .collect();
    }

    let key = constraint.map(str::to_string).or_else(|| {
        message
            .split_once("for key '")
            .and_then(|(_, rest)| rest.split_once('\''))
            .map(|(key, _)| key.to_string())
    });

    match key {
        Some(key) => columns_for_constraint(schema, &key),
        None => Vec::new(),
    }
}

fn columns_for_constraint(schema: &Schema, key: &str) -> Vec<String> {
    let key = key.rsplit('.').next().unwrap_or(key);
    if key == "PRIMARY" || key == format!("{}_pkey", schema.table) {
        return vec![schema.primary_key.to_string()];
    }
    if let Some(field) = schema.field(key) {
        return vec![field.name.to_string()];
    }

    let table_prefix = format!("{}_", schema.table);
    let stem = key.strip_prefix(table_prefix.as_str()).unwrap_or(key);
    let stem = stem.strip_suffix("_key").unwrap_or(stem);
    if let Some(field) = schema.field(stem) {
        return vec![field.name.to_string()];
    }

    schema
        .unique_columns()
        .filter(|column| stem.contains(column))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures::persons;

    #[test]
    fn sqlite_message_lists_columns() {
        let columns = violated_columns(persons(), None, "UNIQUE constraint failed: persons.tax_id");
        assert_eq!(columns, vec!["tax_id"]);
    }

    #[test]
    fn postgres_constraint_names_resolve() {
        assert_eq!(
            violated_columns(persons(), Some("persons_tax_id_key"), "duplicate key value"),
            vec!["tax_id"]
        );
        assert_eq!(
            violated_columns(persons(), Some("persons_pkey"), "duplicate key value"),
            vec!["id"]
        );
    }

    #[test]
    fn mysql_key_names_resolve() {
        assert_eq!(
            violated_columns(
                persons(),
                None,
                "Duplicate entry '1' for key 'persons.tax_id'"
            ),
            vec!["tax_id"]
        );
        assert_eq!(
            violated_columns(persons(), None, "Duplicate entry '1' for key 'PRIMARY'"),
            vec!["id"]
        );
    }

    #[test]
    fn unknown_constraints_yield_no_columns() {
        assert!(violated_columns(persons(), Some("some_index"), "duplicate").is_empty());
    }
}
