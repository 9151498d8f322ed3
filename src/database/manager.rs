use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Process-wide connection pool for the profile and audit database.
pub struct DatabaseManager;

impl DatabaseManager {
    fn slot() -> &'static OnceLock<PgPool> {
        static POOL: OnceLock<PgPool> = OnceLock::new();
        &POOL
    }

    /// Get the shared pool, creating it on first use.
    ///
    /// The pool connects lazily, so this never blocks on the network. Later
    /// calls return the pool created by the first one.
    pub fn pool() -> Result<PgPool, DatabaseError> {
        if let Some(pool) = Self::slot().get() {
            return Ok(pool.clone());
        }

        let pool = Self::connect_lazy(&crate::config::config().database)?;
        // A concurrent initializer may have won; keep whichever pool landed first.
        let pool = Self::slot().get_or_init(|| pool);
        info!("Database pool initialized");
        Ok(pool.clone())
    }

    fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = Self::database_url()?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy(&url)?;
        Ok(pool)
    }

    fn database_url() -> Result<String, DatabaseError> {
        let raw = std::env::var("DATABASE_URL").map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let url = url::Url::parse(&raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        match url.scheme() {
            "postgres" | "postgresql" => Ok(url.into()),
            _ => Err(DatabaseError::InvalidDatabaseUrl),
        }
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check() -> Result<(), DatabaseError> {
        let pool = Self::pool()?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    /// Close the shared pool (e.g., on shutdown)
    pub async fn close() {
        if let Some(pool) = Self::slot().get() {
            pool.close().await;
            info!("Closed database pool");
        }
    }

    /// Quote SQL identifier to prevent injection
    pub fn quote_identifier(name: &str) -> Result<String, DatabaseError> {
        if !Self::is_valid_identifier(name) {
            return Err(DatabaseError::InvalidIdentifier(name.to_string()));
        }
        Ok(format!("\"{}\"", name.replace('"', "\"\"")))
    }

    /// Lowercase ASCII letters, digits and underscores, starting with a letter.
    fn is_valid_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            && name.len() <= 63
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_identifiers() {
        assert!(DatabaseManager::is_valid_identifier("users"));
        assert!(DatabaseManager::is_valid_identifier("admin_logs"));
        assert!(!DatabaseManager::is_valid_identifier("Users"));
        assert!(!DatabaseManager::is_valid_identifier("1users"));
        assert!(!DatabaseManager::is_valid_identifier("users; DROP TABLE users"));
        assert!(!DatabaseManager::is_valid_identifier(""));
    }

    #[test]
    fn quotes_valid_identifiers_only() {
        assert_eq!(DatabaseManager::quote_identifier("users").unwrap(), "\"users\"");
        assert!(DatabaseManager::quote_identifier("users\"--").is_err());
    }
}
