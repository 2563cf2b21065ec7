//! Eager loading
//!
//! Each relation level costs one query: the keys of every parent row are
//! collected and the related rows are fetched with a single `IN` condition.
//! Key sets larger than the store's parameter limit are split into batches.

use crate::criteria::ResolvedJoin;
use crate::errors::StoreError;
use crate::query_builder::{QueryBuilder, QueryFilter, SortOrder};
use crate::schema::{RelationKind, Schema};
use crate::traits::store::StoreSession;
use crate::Fields;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::HashMap;

/// Attach the rows of every joined relation to `rows`, recursing into nested joins
pub(crate) fn load_relations<'a, S: StoreSession>(
    session: &'a mut S,
    schema: &'static Schema,
    rows: &'a mut [Fields],
    joins: &'a [ResolvedJoin],
) -> BoxFuture<'a, Result<(), StoreError>> {
    async move {
        if rows.is_empty() {
            return Ok(());
        }

        for join in joins {
            let relation = join.relation;
            let target = relation.target_schema();

            match relation.kind {
                RelationKind::HasMany { foreign_key } => {
                    let keys = distinct_keys(rows, schema.primary_key);
                    let mut children = fetch_by_keys(session, target, foreign_key, keys).await?;
                    load_relations(&mut *session, target, &mut children, &join.nested).await?;

                    let mut grouped: HashMap<String, Vec<Value>> = HashMap::new();
                    for child in children {
                        let key = key_of(child.get(foreign_key));
                        grouped.entry(key).or_default().push(Value::Object(child));
                    }

                    for row in rows.iter_mut() {
                        let related = grouped
                            .get(&key_of(row.get(schema.primary_key)))
                            .cloned()
                            .unwrap_or_default();
                        row.insert(relation.name.to_string(), Value::Array(related));
                    }
                }
                RelationKind::BelongsTo { foreign_key } => {
                    let keys = distinct_keys(rows, foreign_key);
                    let mut parents = fetch_by_keys(session, target, target.primary_key, keys).await?;
                    load_relations(&mut *session, target, &mut parents, &join.nested).await?;

                    let by_key: HashMap<String, Value> = parents
                        .into_iter()
                        .map(|parent| (key_of(parent.get(target.primary_key)), Value::Object(parent)))
                        .collect();

                    for row in rows.iter_mut() {
                        let related = match row.get(foreign_key) {
                            None | Some(Value::Null) => Value::Null,
                            Some(key) => by_key.get(&key_of(Some(key))).cloned().unwrap_or(Value::Null),
                        };
                        row.insert(relation.name.to_string(), related);
                    }
                }
            }

            crate::trace_log!(
                "loaded relation {}.{} for {} row(s)",
                schema.model,
                relation.name,
                rows.len()
            );
        }

        Ok(())
    }
    .boxed()
}

async fn fetch_by_keys<S: StoreSession>(
    session: &mut S,
    schema: &'static Schema,
    column: &str,
    keys: Vec<Value>,
) -> Result<Vec<Fields>, StoreError> {
    let batch = session.max_in_list().max(1);
    let mut rows = Vec::new();
    for chunk in keys.chunks(batch) {
        let query = QueryBuilder::new()
            .filter(QueryFilter::in_values(column, chunk.to_vec()))
            .order_by(schema.primary_key, SortOrder::Asc);
        rows.extend(session.fetch(schema, &query).await?);
    }
    Ok(rows)
}

/// Non-null values of `column`, first occurrence kept
fn distinct_keys(rows: &[Fields], column: &str) -> Vec<Value> {
    let mut seen = std::collections::HashSet::new();
    rows.iter()
        .filter_map(|row| row.get(column))
        .filter(|value| !value.is_null())
        .filter(|value| seen.insert(key_of(Some(value))))
        .cloned()
        .collect()
}

fn key_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
