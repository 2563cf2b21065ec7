//! SQL generation
//!
//! Renders `QueryBuilder`s and writes into parameterized statements for one
//! dialect. Every identifier is resolved against the schema before it is
//! quoted, and every value is coerced to its column kind before it is bound.

use crate::errors::StoreError;
use crate::query_builder::builder::QueryBuilder;
use crate::query_builder::dialect::Dialect;
use crate::query_builder::filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::ordering::SortOrder;
use crate::schema::{FieldDef, Schema};
use serde_json::Value;
use type_mapping::{coerce, SqlValue};

/// Parameterized SQL ready to execute
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Collects bound values and hands out placeholders in order
struct Params {
    dialect: Dialect,
    values: Vec<SqlValue>,
}

impl Params {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            values: Vec::new(),
        }
    }

    fn push(&mut self, value: SqlValue) -> String {
        self.values.push(value);
        self.dialect.placeholder(self.values.len())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SqlGenerator {
    dialect: Dialect,
}

impl SqlGenerator {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// SELECT every column of the schema
    pub fn select(&self, schema: &Schema, query: &QueryBuilder) -> Result<Statement, StoreError> {
        let mut params = Params::new(self.dialect);
        let columns = schema
            .column_names()
            .map(|name| self.dialect.quote(name))
            .collect::<Vec<_>>()
            .join(", ");

        let parts = [
            format!("SELECT {} FROM {}", columns, self.dialect.quote(schema.table)),
            self.build_where_clause(schema, &query.conditions, &mut params)?,
            self.build_order_clause(schema, &query.order_by)?,
            self.dialect.limit_clause(query.limit, query.offset),
        ];

        Ok(Statement {
            sql: join_parts(&parts),
            params: params.values,
        })
    }

    /// COUNT matching rows; ordering and windowing are ignored
    pub fn count(&self, schema: &Schema, query: &QueryBuilder) -> Result<Statement, StoreError> {
        let mut params = Params::new(self.dialect);
        let parts = [
            format!("SELECT COUNT(*) FROM {}", self.dialect.quote(schema.table)),
            self.build_where_clause(schema, &query.conditions, &mut params)?,
        ];

        Ok(Statement {
            sql: join_parts(&parts),
            params: params.values,
        })
    }

    /// INSERT one row; `returning` names the column to read back, if any
    pub fn insert(
        &self,
        schema: &Schema,
        values: &[(&'static str, SqlValue)],
        returning: Option<&str>,
    ) -> Result<Statement, StoreError> {
        let mut params = Params::new(self.dialect);
        let mut columns = Vec::with_capacity(values.len());
        let mut placeholders = Vec::with_capacity(values.len());

        for (column, value) in values {
            schema.require_field(column)?;
            columns.push(self.dialect.quote(column));
            placeholders.push(params.push(value.clone()));
        }

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.dialect.quote(schema.table),
            columns.join(", "),
            placeholders.join(", ")
        );
        if let Some(column) = returning {
            schema.require_field(column)?;
            sql.push_str(&format!(" RETURNING {}", self.dialect.quote(column)));
        }

        Ok(Statement {
            sql,
            params: params.values,
        })
    }

    /// UPDATE every row matching `conditions`
    pub fn update(
        &self,
        schema: &Schema,
        conditions: &[QueryFilter],
        changes: &[(&'static str, SqlValue)],
    ) -> Result<Statement, StoreError> {
        if changes.is_empty() {
            return Err(StoreError::InvalidValue {
                field: schema.table.to_string(),
                reason: "an update needs at least one column".to_string(),
            });
        }
        require_conditions(schema, conditions)?;

        let mut params = Params::new(self.dialect);
        let mut assignments = Vec::with_capacity(changes.len());
        for (column, value) in changes {
            schema.require_field(column)?;
            let placeholder = params.push(value.clone());
            assignments.push(format!("{} = {}", self.dialect.quote(column), placeholder));
        }

        let parts = [
            format!(
                "UPDATE {} SET {}",
                self.dialect.quote(schema.table),
                assignments.join(", ")
            ),
            self.build_where_clause(schema, conditions, &mut params)?,
        ];

        Ok(Statement {
            sql: join_parts(&parts),
            params: params.values,
        })
    }

    /// DELETE every row matching `conditions`
    pub fn delete(&self, schema: &Schema, conditions: &[QueryFilter]) -> Result<Statement, StoreError> {
        require_conditions(schema, conditions)?;

        let mut params = Params::new(self.dialect);
        let parts = [
            format!("DELETE FROM {}", self.dialect.quote(schema.table)),
            self.build_where_clause(schema, conditions, &mut params)?,
        ];

        Ok(Statement {
            sql: join_parts(&parts),
            params: params.values,
        })
    }

    /// Build WHERE clause from conditions
    fn build_where_clause(
        &self,
        schema: &Schema,
        conditions: &[QueryFilter],
        params: &mut Params,
    ) -> Result<String, StoreError> {
        if conditions.is_empty() {
            return Ok(String::new());
        }

        let conditions_sql = conditions
            .iter()
            .map(|condition| self.build_condition_sql(schema, condition, params))
            .collect::<Result<Vec<_>, _>>()?
            .join(" AND ");

        Ok(format!("WHERE {}", conditions_sql))
    }

    fn build_condition_sql(
        &self,
        schema: &Schema,
        filter: &QueryFilter,
        params: &mut Params,
    ) -> Result<String, StoreError> {
        match filter {
            QueryFilter::Condition(condition) => {
                self.build_single_condition_sql(schema, condition, params)
            }
            QueryFilter::Group { operator, filters } => {
                if filters.is_empty() {
                    // Neutral element of the group
                    return Ok(match operator {
                        LogicalOperator::And => "1=1".to_string(),
                        LogicalOperator::Or => "1=0".to_string(),
                    });
                }

                let operator_str = match operator {
                    LogicalOperator::And => " AND ",
                    LogicalOperator::Or => " OR ",
                };

                let group_conditions = filters
                    .iter()
                    .map(|f| self.build_condition_sql(schema, f, params))
                    .collect::<Result<Vec<_>, _>>()?
                    .join(operator_str);

                Ok(format!("({})", group_conditions))
            }
            QueryFilter::Not(inner) => Ok(format!(
                "NOT ({})",
                self.build_condition_sql(schema, inner, params)?
            )),
        }
    }

    fn build_single_condition_sql(
        &self,
        schema: &Schema,
        condition: &QueryCondition,
        params: &mut Params,
    ) -> Result<String, StoreError> {
        let field = schema.require_field(&condition.field)?;
        let column = self.dialect.quote(field.name);
        let value = condition.value.as_ref().filter(|value| !value.is_null());

        let sql = match (&condition.operator, value) {
            (QueryOperator::IsNull, _) | (QueryOperator::Eq, None) => {
                format!("{} IS NULL", column)
            }
            (QueryOperator::IsNotNull, _) | (QueryOperator::Ne, None) => {
                format!("{} IS NOT NULL", column)
            }
            // Ordering comparisons against NULL never match
            (QueryOperator::Gt | QueryOperator::Gte | QueryOperator::Lt | QueryOperator::Lte, None)
            | (QueryOperator::Like | QueryOperator::Contains, None) => "1=0".to_string(),
            (QueryOperator::In, None) => "1=0".to_string(),
            (QueryOperator::NotIn, None) => "1=1".to_string(),
            (QueryOperator::Eq, Some(value)) => {
                format!("{} = {}", column, params.push(bind(field, value)?))
            }
            (QueryOperator::Ne, Some(value)) => {
                format!("{} != {}", column, params.push(bind(field, value)?))
            }
            (QueryOperator::Gt, Some(value)) => {
                format!("{} > {}", column, params.push(bind(field, value)?))
            }
            (QueryOperator::Gte, Some(value)) => {
                format!("{} >= {}", column, params.push(bind(field, value)?))
            }
            (QueryOperator::Lt, Some(value)) => {
                format!("{} < {}", column, params.push(bind(field, value)?))
            }
            (QueryOperator::Lte, Some(value)) => {
                format!("{} <= {}", column, params.push(bind(field, value)?))
            }
            (QueryOperator::Like, Some(value)) => {
                let pattern = text_operand(field, value)?;
                format!("{} LIKE {}", self.text_column(field), params.push(SqlValue::Text(pattern)))
            }
            (QueryOperator::Contains, Some(value)) => {
                let pattern = format!("%{}%", text_operand(field, value)?);
                format!("{} LIKE {}", self.text_column(field), params.push(SqlValue::Text(pattern)))
            }
            (QueryOperator::In, Some(value)) => match list_operand(value) {
                values if values.is_empty() => "1=0".to_string(),
                values => format!("{} IN ({})", column, self.bind_list(field, &values, params)?),
            },
            (QueryOperator::NotIn, Some(value)) => match list_operand(value) {
                values if values.is_empty() => "1=1".to_string(),
                values => format!("{} NOT IN ({})", column, self.bind_list(field, &values, params)?),
            },
        };

        Ok(sql)
    }

    fn bind_list(
        &self,
        field: &FieldDef,
        values: &[&Value],
        params: &mut Params,
    ) -> Result<String, StoreError> {
        let placeholders = values
            .iter()
            .map(|value| bind(field, value).map(|bound| params.push(bound)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(placeholders.join(", "))
    }

    /// Column expression usable with LIKE
    fn text_column(&self, field: &FieldDef) -> String {
        let column = self.dialect.quote(field.name);
        if self.dialect == Dialect::Postgres && !field.kind.is_textual() {
            format!("CAST({} AS TEXT)", column)
        } else {
            column
        }
    }

    /// Build ORDER BY clause
    fn build_order_clause(
        &self,
        schema: &Schema,
        order_by: &[(String, SortOrder)],
    ) -> Result<String, StoreError> {
        if order_by.is_empty() {
            return Ok(String::new());
        }

        let order_items = order_by
            .iter()
            .map(|(field, order)| {
                schema
                    .require_field(field)
                    .map(|def| format!("{} {}", self.dialect.quote(def.name), order.to_sql()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(format!("ORDER BY {}", order_items.join(", ")))
    }
}

/// Writes always target a selection, never the whole table
fn require_conditions(schema: &Schema, conditions: &[QueryFilter]) -> Result<(), StoreError> {
    if conditions.is_empty() {
        return Err(StoreError::InvalidValue {
            field: schema.table.to_string(),
            reason: "a bulk write needs at least one condition".to_string(),
        });
    }
    Ok(())
}

fn join_parts(parts: &[String]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Coerce a condition operand to the column kind
pub(crate) fn bind(field: &FieldDef, value: &Value) -> Result<SqlValue, StoreError> {
    coerce(field.kind, value).map_err(|e| StoreError::InvalidValue {
        field: field.name.to_string(),
        reason: e.to_string(),
    })
}

fn text_operand(field: &FieldDef, value: &Value) -> Result<String, StoreError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(StoreError::InvalidValue {
            field: field.name.to_string(),
            reason: format!("expected a text pattern, found {}", other),
        }),
    }
}

fn list_operand(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(values) => values.iter().collect(),
        single => vec![single],
    }
}
