//! Engine
//!
//! Builds the connection pool for the configured backend and hands out
//! controllers that share it.

use sqlx::pool::PoolOptions;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::Database;
use std::str::FromStr;
use std::time::Duration;
use store_object::{Record, SqlStore};

use crate::controller::Controller;
use crate::errors::EngineError;
use config::{AppConfig, DatabaseConfig, DatabaseKind};

/// Connected database plus the configuration it was built from
#[derive(Debug, Clone)]
pub struct Engine {
    store: SqlStore,
    config: DatabaseConfig,
}

impl Engine {
    /// Connect a pool for `config.kind`
    pub async fn connect(config: DatabaseConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let connection_string = config.connection_string();

        let store = match config.kind {
            DatabaseKind::Postgres => {
                SqlStore::postgres(pool_options(&config).connect(&connection_string).await?)
            }
            DatabaseKind::MySql => {
                SqlStore::mysql(pool_options(&config).connect(&connection_string).await?)
            }
            DatabaseKind::Sqlite => {
                let options =
                    SqliteConnectOptions::from_str(&connection_string)?.create_if_missing(true);
                SqlStore::sqlite(pool_options(&config).connect_with(options).await?)
            }
        };

        crate::debug_log!("connected to {} database {}", config.kind, config.database);
        Ok(Self { store, config })
    }

    /// Connect using the `DB_*` environment variables and an optional `.env` file
    pub async fn from_env() -> Result<Self, EngineError> {
        Self::connect(DatabaseConfig::from_env()?).await
    }

    /// Connect using `AppConfig::load`
    pub async fn load() -> Result<Self, EngineError> {
        Self::connect(AppConfig::load()?.database).await
    }

    pub fn store(&self) -> &SqlStore {
        &self.store
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Controller for records of type `T` on this engine's pool
    pub fn controller<T: Record>(&self) -> Controller<T, SqlStore> {
        Controller::new(self.store.clone())
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), EngineError> {
        self.store.ping().await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.store.close().await;
    }
}

fn pool_options<DB: Database>(config: &DatabaseConfig) -> PoolOptions<DB> {
    let mut options = PoolOptions::<DB>::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

    if config.max_lifetime_seconds > 0 {
        options = options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
    }

    options
}
