use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Seed error: {0}")]
    Seed(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// True when the error is a unique-constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Sqlx(sqlx::Error::Database(db)) => db.code().as_deref() == Some("23505"),
            _ => false,
        }
    }

    /// True when the error is a foreign-key violation.
    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            DatabaseError::Sqlx(sqlx::Error::Database(db)) => db.code().as_deref() == Some("23503"),
            _ => false,
        }
    }
}

/// Process-wide connection pool.
///
/// The pool connects lazily, so the server can boot and report a degraded
/// `/health` while Postgres is unreachable.
pub struct DatabaseManager;

static POOL: OnceLock<PgPool> = OnceLock::new();

impl DatabaseManager {
    /// Get the shared pool, creating it on first use
    pub fn pool() -> Result<PgPool, DatabaseError> {
        if let Some(pool) = POOL.get() {
            return Ok(pool.clone());
        }

        let pool = Self::connect_lazy()?;
        // A racing initialiser may have won; either pool is equivalent.
        Ok(POOL.get_or_init(|| pool).clone())
    }

    fn connect_lazy() -> Result<PgPool, DatabaseError> {
        let db = &config::config().database;
        if db.url.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }
        Self::validate_url(&db.url)?;

        let pool = PgPoolOptions::new()
            .max_connections(db.max_connections)
            .acquire_timeout(Duration::from_secs(db.acquire_timeout_secs))
            .connect_lazy(&db.url)?;

        info!("Created database pool (max {} connections)", db.max_connections);
        Ok(pool)
    }

    fn validate_url(raw: &str) -> Result<(), DatabaseError> {
        let url = url::Url::parse(raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        match url.scheme() {
            "postgres" | "postgresql" => Ok(()),
            _ => Err(DatabaseError::InvalidDatabaseUrl),
        }
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check() -> Result<(), DatabaseError> {
        let pool = Self::pool()?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    /// Apply pending migrations from `migrations/`
    pub async fn migrate() -> Result<(), DatabaseError> {
        let pool = Self::pool()?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close() {
        if let Some(pool) = POOL.get() {
            pool.close().await;
            info!("Closed database pool");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_url_scheme() {
        assert!(DatabaseManager::validate_url("postgres://u:p@localhost:5432/mindfulspace").is_ok());
        assert!(DatabaseManager::validate_url("postgresql://localhost/db").is_ok());
        assert!(DatabaseManager::validate_url("mysql://localhost/db").is_err());
        assert!(DatabaseManager::validate_url("not a url").is_err());
    }

    #[test]
    fn plain_errors_are_not_constraint_violations() {
        assert!(!DatabaseError::NotFound("x".into()).is_unique_violation());
        assert!(!DatabaseError::Sqlx(sqlx::Error::RowNotFound).is_foreign_key_violation());
    }
}
