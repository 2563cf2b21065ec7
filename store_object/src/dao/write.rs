use super::core::{store_error, Dao};
use crate::criteria::{JoinSpec, Selector};
use crate::errors::DaoError;
use crate::id_type::RecordId;
use crate::schema::Schema;
use crate::traits::record::Record;
use crate::traits::store::{Assignments, StoreSession};
use crate::Fields;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use type_mapping::{coerce, FieldKind, SqlValue};
use uuid::Uuid;

pub(crate) const CREATED_AT: &str = "created_at";
pub(crate) const UPDATED_AT: &str = "updated_at";

const CREATING: &str = "creating";
const UPDATING: &str = "updating";
const UPSERTING: &str = "upserting";
const ARCHIVING: &str = "archiving";
const DELETING: &str = "deleting";

impl<T: Record, S: StoreSession> Dao<T, S> {
    /// Insert a record built from `data` and return its identifier
    pub async fn create<D: Serialize + ?Sized>(&mut self, data: &D) -> Result<RecordId, DaoError> {
        self.insert_record(data, CREATING).await
    }

    /// Overwrite the non-null fields of `data` on the record matching `selector`
    pub async fn update<D: Serialize + ?Sized>(
        &mut self,
        selector: &Selector,
        data: &D,
    ) -> Result<RecordId, DaoError> {
        self.patch_record(selector, data, UPDATING).await
    }

    /// Create when nothing matches `selector`, update otherwise
    pub async fn upsert<D: Serialize + ?Sized>(
        &mut self,
        selector: &Selector,
        data: &D,
    ) -> Result<RecordId, DaoError> {
        match self.get(selector, &JoinSpec::new()).await? {
            Some(_) => self.patch_record(selector, data, UPSERTING).await,
            None => self.insert_record(data, UPSERTING).await,
        }
    }

    async fn insert_record<D: Serialize + ?Sized>(
        &mut self,
        data: &D,
        action: &'static str,
    ) -> Result<RecordId, DaoError> {
        let schema = Self::schema();
        let payload = payload_object(schema, data)?;
        let (payload, values) = insert_assignments(schema, payload, Utc::now())?;

        let id = self
            .session
            .insert(schema, values)
            .await
            .map_err(|e| store_error::<T>(action, e, Some(&payload)))?;
        crate::debug_log!("created {} {}", schema.model, id);
        Ok(id)
    }

    async fn patch_record<D: Serialize + ?Sized>(
        &mut self,
        selector: &Selector,
        data: &D,
        action: &'static str,
    ) -> Result<RecordId, DaoError> {
        let schema = Self::schema();
        let mut payload = payload_object(schema, data)?;
        payload.retain(|_, value| !value.is_null());
        check_keys(schema, &payload)?;

        let existing = self
            .get(selector, &JoinSpec::new())
            .await?
            .ok_or_else(|| DaoError::NotFound {
                model: schema.model,
                selector: selector.to_string(),
            })?;
        let id = existing.id();
        let changes = update_assignments(schema, &mut payload, id, Utc::now())?;

        let by_id = Selector::id(schema, id).to_filters(schema)?;
        self.session
            .update(schema, &by_id, changes)
            .await
            .map_err(|e| store_error::<T>(action, e, Some(&payload)))?;
        crate::debug_log!("updated {} {}", schema.model, id);
        Ok(id)
    }

    /// Flag every record matching `selector` as archived
    pub async fn archive(&mut self, selector: &Selector) -> Result<u64, DaoError> {
        let schema = Self::schema();
        let archive_field = schema.archive_field.ok_or_else(|| {
            DaoError::argument(format!("{} does not support archiving", schema.model))
        })?;
        let filters = self.matching_filters(selector, ARCHIVING).await?;

        let mut changes: Assignments = vec![(archive_field, SqlValue::Bool(true))];
        if schema.field(UPDATED_AT).is_some() {
            changes.push((UPDATED_AT, SqlValue::DateTime(Utc::now())));
        }

        let archived = self
            .session
            .update(schema, &filters, changes)
            .await
            .map_err(|e| store_error::<T>(ARCHIVING, e, None))?;
        crate::debug_log!("archived {} {} record(s)", archived, schema.model);
        Ok(archived)
    }

    /// Remove every record matching `selector`
    pub async fn delete(&mut self, selector: &Selector) -> Result<u64, DaoError> {
        let schema = Self::schema();
        let filters = self.matching_filters(selector, DELETING).await?;
        let deleted = self
            .session
            .delete(schema, &filters)
            .await
            .map_err(|e| store_error::<T>(DELETING, e, None))?;
        crate::debug_log!("deleted {} {} record(s)", deleted, schema.model);
        Ok(deleted)
    }
}

fn payload_object<D: Serialize + ?Sized>(schema: &Schema, data: &D) -> Result<Fields, DaoError> {
    match serde_json::to_value(data) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(DaoError::argument(format!(
            "{} data must be an object, found {}",
            schema.model, other
        ))),
        Err(e) => Err(DaoError::argument(format!(
            "{} data could not be serialized: {}",
            schema.model, e
        ))),
    }
}

/// Every key must name a stored column; relations are not writable
fn check_keys(schema: &Schema, payload: &Fields) -> Result<(), DaoError> {
    for key in payload.keys() {
        if schema.relation(key).is_some() {
            return Err(DaoError::argument(format!(
                "Relation '{}' of {} cannot be written directly",
                key, schema.model
            )));
        }
        if schema.field(key).is_none() {
            return Err(DaoError::argument(format!(
                "{} has no field named '{}'",
                schema.model, key
            )));
        }
    }
    Ok(())
}

fn timestamp(now: DateTime<Utc>) -> Value {
    Value::String(now.to_rfc3339())
}

/// Column values of a new record: bookkeeping stamped, key generated if needed
///
/// Returns the completed payload alongside the coerced values.
fn insert_assignments(
    schema: &'static Schema,
    mut payload: Fields,
    now: DateTime<Utc>,
) -> Result<(Fields, Assignments), DaoError> {
    check_keys(schema, &payload)?;

    for column in [CREATED_AT, UPDATED_AT] {
        if schema.field(column).is_some() {
            payload.insert(column.to_string(), timestamp(now));
        }
    }
    if let Some(archive_field) = schema.archive_field {
        payload.insert(archive_field.to_string(), Value::Bool(false));
    }

    let primary_key = schema
        .primary_key_field()
        .map_err(|e| DaoError::argument(e.to_string()))?;
    let key_missing = payload
        .get(primary_key.name)
        .map_or(true, Value::is_null);
    if key_missing {
        match primary_key.kind {
            FieldKind::Uuid => {
                payload.insert(
                    primary_key.name.to_string(),
                    Value::String(Uuid::new_v4().to_string()),
                );
            }
            _ => {
                payload.remove(primary_key.name);
            }
        }
    }

    let values = coerce_payload(schema, &payload)?;
    Ok((payload, values))
}

/// Changes for an existing record; the key must not move and `created_at` is kept
fn update_assignments(
    schema: &'static Schema,
    payload: &mut Fields,
    id: RecordId,
    now: DateTime<Utc>,
) -> Result<Assignments, DaoError> {
    let primary_key = schema
        .primary_key_field()
        .map_err(|e| DaoError::argument(e.to_string()))?;

    if let Some(value) = payload.remove(primary_key.name) {
        let requested = coerce(primary_key.kind, &value)
            .map_err(|e| DaoError::argument(format!("Invalid value for {}: {}", primary_key.name, e)))?;
        if requested != id.to_sql_value() {
            return Err(DaoError::argument(format!(
                "The primary key of {} cannot be changed",
                schema.model
            )));
        }
    }

    payload.remove(CREATED_AT);
    if schema.field(UPDATED_AT).is_some() {
        payload.insert(UPDATED_AT.to_string(), timestamp(now));
    }

    coerce_payload(schema, payload)
}

/// Coerce every payload value against its column, in schema order
fn coerce_payload(schema: &'static Schema, payload: &Fields) -> Result<Assignments, DaoError> {
    let mut values = Assignments::new();

    for field in &schema.fields {
        let Some(value) = payload.get(field.name) else {
            continue;
        };
        if value.is_null() && !field.nullable {
            return Err(DaoError::argument(format!(
                "{}.{} cannot be null",
                schema.model, field.name
            )));
        }
        let coerced = coerce(field.kind, value).map_err(|e| {
            DaoError::argument(format!("Invalid value for {}.{}: {}", schema.model, field.name, e))
        })?;
        values.push((field.name, coerced));
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures::persons;
    use chrono::TimeZone;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn columns(values: &Assignments) -> Vec<&'static str> {
        values.iter().map(|(column, _)| *column).collect()
    }

    #[test]
    fn create_stamps_bookkeeping_and_drops_null_integer_key() {
        let payload = fields(json!({"id": null, "tax_id": 1, "name": "Ada", "birth_date": "1990-05-01"}));
        let (_, values) = insert_assignments(persons(), payload, now()).unwrap();

        assert_eq!(
            columns(&values),
            vec!["tax_id", "name", "birth_date", "created_at", "updated_at", "archived"]
        );
        assert!(values.contains(&("created_at", SqlValue::DateTime(now()))));
        assert!(values.contains(&("archived", SqlValue::Bool(false))));
    }

    #[test]
    fn create_rejects_unknown_and_relation_keys() {
        let err = insert_assignments(persons(), fields(json!({"nope": 1})), now()).unwrap_err();
        assert_eq!(err, DaoError::Argument("PersonModel has no field named 'nope'".to_string()));

        let err = insert_assignments(persons(), fields(json!({"addresses": []})), now()).unwrap_err();
        assert!(matches!(err, DaoError::Argument(_)));
    }

    #[test]
    fn create_rejects_values_that_do_not_coerce() {
        let payload = fields(json!({"tax_id": "abc", "name": "Ada"}));
        let err = insert_assignments(persons(), payload, now()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid value for PersonModel.tax_id"));

        let payload = fields(json!({"name": null}));
        let err = insert_assignments(persons(), payload, now()).unwrap_err();
        assert_eq!(err.to_string(), "PersonModel.name cannot be null");
    }

    #[test]
    fn create_allows_null_in_nullable_columns() {
        let payload = fields(json!({"name": "Ada", "nickname": null}));
        let (_, values) = insert_assignments(persons(), payload, now()).unwrap();
        assert!(values.contains(&("nickname", SqlValue::Null(FieldKind::Text))));
    }

    #[test]
    fn update_keeps_created_at_and_stamps_updated_at() {
        let mut payload = fields(json!({"name": "Grace", "created_at": "2000-01-01T00:00:00Z"}));
        let values = update_assignments(persons(), &mut payload, RecordId::Numeric(3), now()).unwrap();
        assert_eq!(columns(&values), vec!["name", "updated_at"]);
        assert_eq!(values[1].1, SqlValue::DateTime(now()));
    }

    #[test]
    fn update_accepts_the_same_key_and_rejects_a_new_one() {
        let mut payload = fields(json!({"id": 3, "name": "Grace"}));
        let values = update_assignments(persons(), &mut payload, RecordId::Numeric(3), now()).unwrap();
        assert_eq!(columns(&values), vec!["name", "updated_at"]);

        let mut payload = fields(json!({"id": 4}));
        let err = update_assignments(persons(), &mut payload, RecordId::Numeric(3), now()).unwrap_err();
        assert_eq!(err.to_string(), "The primary key of PersonModel cannot be changed");
    }

    #[test]
    fn payload_must_be_an_object() {
        let err = payload_object(persons(), &json!([1, 2])).unwrap_err();
        assert!(matches!(err, DaoError::Argument(_)));
    }
}
