//! sqlx-backed record store
//!
//! PostgreSQL, MySQL and SQLite are dispatched by enum; statements come from
//! the query builder's SQL generator for the matching dialect.

mod binding;
pub mod core;
pub mod session;

pub use self::core::{DbPool, SqlStore};
pub use session::SqlSession;
