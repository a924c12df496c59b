use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Postgres SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error(transparent)]
    Migration(#[from] MigrateError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return DatabaseError::Conflict(
                    db.constraint()
                        .map(|c| format!("Duplicate value violates {}", c))
                        .unwrap_or_else(|| "Duplicate value".to_string()),
                );
            }
        }

        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::Connection("connection pool timed out".to_string()),
            sqlx::Error::PoolClosed => DatabaseError::Connection("connection pool closed".to_string()),
            sqlx::Error::Io(e) => DatabaseError::Connection(e.to_string()),
            other => DatabaseError::Sqlx(other),
        }
    }
}

/// Process-scoped connection pool, built once at startup and shared through
/// router state.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connect eagerly; startup fails if the database is unreachable.
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let pool = Self::pool_options(config)
            .connect(&config.url)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        info!(max_connections = config.max_connections, "Created database pool");
        Ok(pool)
    }

    /// Build a pool that opens connections on first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        Self::pool_options(config)
            .connect_lazy(&config.url)
            .map_err(|e| DatabaseError::Connection(e.to_string()))
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Apply every pending migration.
    pub async fn migrate_up(pool: &PgPool) -> Result<(), DatabaseError> {
        MIGRATOR.run(pool).await?;
        info!("All migrations applied");
        Ok(())
    }

    /// Revert every migration newer than `target` (0 reverts everything).
    pub async fn migrate_down_to(pool: &PgPool, target: i64) -> Result<(), DatabaseError> {
        MIGRATOR.undo(pool, target).await?;
        info!(target, "Migrations reverted");
        Ok(())
    }

    /// Revert only the most recently applied migration.
    pub async fn migrate_last_down(pool: &PgPool) -> Result<Option<i64>, DatabaseError> {
        let applied = Self::applied_versions(pool).await?;
        let Some(&last) = applied.last() else {
            info!("No migrations to roll back");
            return Ok(None);
        };
        let target = applied.iter().rev().nth(1).copied().unwrap_or(0);
        Self::migrate_down_to(pool, target).await?;
        Ok(Some(last))
    }

    /// Versions recorded as applied, oldest first.
    pub async fn applied_versions(pool: &PgPool) -> Result<Vec<i64>, DatabaseError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = '_sqlx_migrations')",
        )
        .fetch_one(pool)
        .await?;

        if !exists {
            return Ok(Vec::new());
        }

        let versions = sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success ORDER BY version")
            .fetch_all(pool)
            .await?;
        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_reversible_migrations_in_order() {
        let versions: Vec<i64> = MIGRATOR.iter().filter(|m| m.migration_type.is_up_migration()).map(|m| m.version).collect();
        assert!(versions.len() >= 3);
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
        assert!(MIGRATOR.iter().any(|m| m.migration_type.is_down_migration()));
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = DatabaseError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[test]
    fn pool_timeout_maps_to_connection_error() {
        let err = DatabaseError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DatabaseError::Connection(_)));
    }
}
