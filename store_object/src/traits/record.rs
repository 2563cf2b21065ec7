//! Record trait
//!
//! Implemented by `#[derive(Record)]`; hand-written implementations must keep
//! `schema()` in sync with the struct's serde representation.

use crate::criteria::JoinSpec;
use crate::id_type::RecordId;
use crate::schema::Schema;
use crate::Fields;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// A persisted model type
pub trait Record: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Field registry of the type
    fn schema() -> &'static Schema;

    fn id(&self) -> RecordId;

    fn created_at(&self) -> DateTime<Utc>;

    fn updated_at(&self) -> DateTime<Utc>;

    /// Soft-delete marker; always false for types without an archive column
    fn is_archived(&self) -> bool {
        false
    }

    /// Serialize into a field mapping, keeping only the relations named in `joins`
    fn to_dict(&self, joins: &JoinSpec) -> Result<Fields, serde_json::Error> {
        crate::serialization::to_dict(self, Self::schema(), joins)
    }
}
