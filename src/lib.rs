//! # recordhaus
//!
//! A generic data-access layer: CRUD, declarative filtering and ordering,
//! eager loading of related records, pagination, soft archival and upsert
//! over PostgreSQL, MySQL or SQLite, parameterized by a record type.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use recordhaus::prelude::*;
//!
//! #[model]
//! #[table(name = "persons")]
//! pub struct PersonModel {
//!     #[primary_key]
//!     pub id: i64,
//!
//!     #[field(unique)]
//!     pub tax_id: i64,
//!
//!     pub name: String,
//!     pub birth_date: NaiveDate,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Engine::from_env().await?;
//!     let persons = engine.controller::<PersonModel>();
//!
//!     persons
//!         .create(
//!             &json!({"tax_id": 1, "name": "Ada", "birth_date": "1815-12-10"}),
//!             Returning::Id,
//!         )
//!         .await?;
//!
//!     let filter = FilterSpec::from_value(&json!({"name": {"contains": "Ad"}}))?;
//!     let view = persons
//!         .list(&filter, &OrderSpec::new().asc("name"), &JoinSpec::new(), ListMode::paginated())
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&view)?);
//!
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod controller;
pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use controller::{Controller, ListMode, ListView, Returning, Saved};
pub use core::Engine;
pub use errors::EngineError;

// Re-export centralized config
pub use config::{AppConfig, ConfigError, DatabaseConfig, DatabaseKind};

// Re-export internal crates used by macros and public API
// These MUST be public for the generated macro code to work correctly
pub use store_object;
pub use table_derive;
pub use type_mapping;
