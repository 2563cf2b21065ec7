//! Error types for the recordhaus crate
//!
//! Engine construction and health checks report `EngineError`; every record
//! operation reports `store_object::DaoError`.

use config::ConfigError;
use store_object::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
