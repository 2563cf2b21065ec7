//! Unified type mapping between Rust field types, JSON payloads and SQL values.
//! This crate provides the mapping logic shared by the `#[model]` macro and the
//! recordhaus runtime.

pub mod coerce;
pub mod sql;
pub mod types;
pub mod validate;

pub use coerce::{coerce, CoercionError};
pub use sql::{is_optional_type, rust_type_to_field_kind, strip_option};
pub use types::{FieldKind, SqlValue};
pub use validate::{validate_identifier, IdentifierError};
