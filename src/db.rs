//! Database connection and pool management for the registry.
//!
//! This module provides functionality to initialize and manage a SeaORM
//! connection pool (Postgres in deployments, SQLite for local runs and tests).

use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::config::AppConfig;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {source}")]
    ConnectionFailed {
        #[from]
        source: sea_orm::DbErr,
    },
    #[error("Database connection timeout after {timeout_ms}ms")]
    ConnectionTimeout { timeout_ms: u64 },
    #[error("Invalid database configuration: {message}")]
    InvalidConfiguration { message: String },
}

const CONNECT_ATTEMPTS: u32 = 5;

/// Initializes a database connection pool with the given configuration.
///
/// Each connection attempt is bounded by `db_acquire_timeout_ms` and retried
/// with exponential backoff, so the service tolerates a database that is
/// still starting up.
///
/// # Examples
///
/// ```no_run
/// use idp_registry::{config::AppConfig, db::init_pool};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = AppConfig::default();
///     let db = init_pool(&config).await?;
///     Ok(())
/// }
/// ```
pub async fn init_pool(cfg: &AppConfig) -> Result<DatabaseConnection> {
    if cfg.database_url.is_empty() {
        return Err(DatabaseError::InvalidConfiguration {
            message: "Database URL cannot be empty".to_string(),
        }
        .into());
    }

    let connect_timeout = Duration::from_millis(cfg.db_acquire_timeout_ms);
    let mut opt = ConnectOptions::new(&cfg.database_url);
    opt.max_connections(cfg.db_max_connections)
        .acquire_timeout(connect_timeout)
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let mut backoff = Duration::from_millis(100);
    let mut attempt = 1;

    loop {
        let failure = match timeout(connect_timeout, Database::connect(opt.clone())).await {
            Ok(Ok(conn)) => {
                tracing::info!(attempt, "Connected to database");
                return Ok(conn);
            }
            Ok(Err(source)) => DatabaseError::ConnectionFailed { source },
            Err(_) => DatabaseError::ConnectionTimeout {
                timeout_ms: cfg.db_acquire_timeout_ms,
            },
        };

        if attempt == CONNECT_ATTEMPTS {
            tracing::error!(attempts = attempt, error = %failure, "Giving up on database connection");
            return Err(failure.into());
        }

        tracing::warn!(
            attempt,
            error = %failure,
            retry_in = ?backoff,
            "Database connection attempt failed"
        );
        sleep(backoff).await;
        backoff *= 2;
        attempt += 1;
    }
}

/// Applies all pending migrations.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .context("Failed to apply database migrations")?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Verifies that the database answers a trivial query.
pub async fn health_check(db: &DatabaseConnection) -> Result<()> {
    let stmt = Statement::from_string(db.get_database_backend(), "SELECT 1".to_string());

    db.query_one(stmt)
        .await
        .context("Database health check failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_database_url() {
        let config = AppConfig {
            database_url: "".to_string(),
            ..Default::default()
        };

        let result = init_pool(&config).await;

        assert!(matches!(
            result.unwrap_err().downcast::<DatabaseError>(),
            Ok(DatabaseError::InvalidConfiguration { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_database_fails_after_retries() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = AppConfig {
            database_url: format!(
                "sqlite://{}",
                dir.path().join("missing").join("registry.db").display()
            ),
            db_max_connections: 1,
            ..Default::default()
        };

        let result = init_pool(&config).await;

        assert!(matches!(
            result.unwrap_err().downcast::<DatabaseError>(),
            Ok(DatabaseError::ConnectionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_health_check_and_migrations_on_sqlite() {
        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 1,
            ..Default::default()
        };

        let db = init_pool(&config).await.expect("sqlite connects");
        run_migrations(&db).await.expect("migrations apply");
        health_check(&db).await.expect("database answers");
    }
}
