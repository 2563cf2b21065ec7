//! Record serialization
//!
//! Records serialize to JSON field mappings. Relation fields appear only when
//! the join specification of the call asked for them, at every nesting level.

use crate::criteria::JoinSpec;
use crate::schema::{RelationKind, Schema};
use crate::Fields;
use serde::Serialize;
use serde_json::Value;

/// Serialize `record` and keep only the relations named in `joins`
pub fn to_dict<T: Serialize + ?Sized>(
    record: &T,
    schema: &Schema,
    joins: &JoinSpec,
) -> Result<Fields, serde_json::Error> {
    match serde_json::to_value(record)? {
        Value::Object(mut fields) => {
            prune_relations(&mut fields, schema, joins);
            Ok(fields)
        }
        other => Err(serde::ser::Error::custom(format!(
            "{} did not serialize to an object: {}",
            schema.model, other
        ))),
    }
}

fn prune_relations(fields: &mut Fields, schema: &Schema, joins: &JoinSpec) {
    for relation in &schema.relations {
        let Some(join) = joins.get(relation.name) else {
            fields.remove(relation.name);
            continue;
        };

        let target = relation.target_schema();
        let entry = fields.entry(relation.name).or_insert(match relation.kind {
            RelationKind::HasMany { .. } => Value::Array(Vec::new()),
            RelationKind::BelongsTo { .. } => Value::Null,
        });

        match entry {
            Value::Array(items) => {
                for item in items.iter_mut() {
                    if let Value::Object(nested) = item {
                        prune_relations(nested, target, &join.nested);
                    }
                }
            }
            Value::Object(nested) => prune_relations(nested, target, &join.nested),
            _ => {}
        }
    }
}
