use super::session::SqlSession;
use crate::errors::StoreError;
use crate::query_builder::Dialect;
use crate::traits::store::RecordStore;
use async_trait::async_trait;
use sqlx::{MySqlPool, PgPool, SqlitePool};

/// Connection pool for one of the supported backends
#[derive(Debug, Clone)]
pub enum DbPool {
    Postgres(PgPool),
    MySql(MySqlPool),
    Sqlite(SqlitePool),
}

impl From<PgPool> for DbPool {
    fn from(pool: PgPool) -> Self {
        DbPool::Postgres(pool)
    }
}

impl From<MySqlPool> for DbPool {
    fn from(pool: MySqlPool) -> Self {
        DbPool::MySql(pool)
    }
}

impl From<SqlitePool> for DbPool {
    fn from(pool: SqlitePool) -> Self {
        DbPool::Sqlite(pool)
    }
}

/// Record store backed by a sqlx pool; every session is one transaction
#[derive(Debug, Clone)]
pub struct SqlStore {
    pool: DbPool,
}

impl SqlStore {
    pub fn new(pool: impl Into<DbPool>) -> Self {
        Self { pool: pool.into() }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::new(pool)
    }

    pub fn mysql(pool: MySqlPool) -> Self {
        Self::new(pool)
    }

    pub fn sqlite(pool: SqlitePool) -> Self {
        Self::new(pool)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn dialect(&self) -> Dialect {
        match &self.pool {
            DbPool::Postgres(_) => Dialect::Postgres,
            DbPool::MySql(_) => Dialect::MySql,
            DbPool::Sqlite(_) => Dialect::Sqlite,
        }
    }

    /// Round-trip a trivial query through the pool
    pub async fn ping(&self) -> Result<(), StoreError> {
        let result = match &self.pool {
            DbPool::Postgres(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
            DbPool::MySql(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
            DbPool::Sqlite(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
        };
        result.map_err(|e| StoreError::Database(e.to_string()))
    }

    pub async fn close(&self) {
        match &self.pool {
            DbPool::Postgres(pool) => pool.close().await,
            DbPool::MySql(pool) => pool.close().await,
            DbPool::Sqlite(pool) => pool.close().await,
        }
    }
}

#[async_trait]
impl RecordStore for SqlStore {
    type Session = SqlSession;

    async fn begin(&self) -> Result<SqlSession, StoreError> {
        let session = match &self.pool {
            DbPool::Postgres(pool) => pool.begin().await.map(SqlSession::Postgres),
            DbPool::MySql(pool) => pool.begin().await.map(SqlSession::MySql),
            DbPool::Sqlite(pool) => pool.begin().await.map(SqlSession::Sqlite),
        };
        tracing::trace!(dialect = %self.dialect(), "transaction opened");
        session.map_err(|e| StoreError::Database(e.to_string()))
    }
}
