//! Access object
//!
//! `Dao<T, S>` owns one store session and runs every operation for record
//! type `T` through it: lookups, composable list queries, pagination and the
//! write paths (create, update, upsert, archive, delete).

mod core;
mod relations;
mod write;

pub use self::core::Dao;
