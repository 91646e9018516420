//! SQLite connection pool configuration and utilities.
//!
//! Both stores open their file through [`create_pool_with_config`], so the
//! pragmas every invariant depends on (foreign keys for comment cascades,
//! WAL plus a busy timeout for concurrent writers) are set in one place.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;
use std::time::Duration;

/// Pool configuration options.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Minimum number of connections to maintain.
    pub min_connections: u32,
    /// Timeout for acquiring a connection.
    pub acquire_timeout: Duration,
    /// Maximum idle time before a connection is closed.
    pub idle_timeout: Option<Duration>,
    /// Maximum lifetime of a connection.
    pub max_lifetime: Option<Duration>,
    /// SQLite busy timeout.
    pub busy_timeout: Duration,
    /// Cache size in KB (negative values).
    pub cache_size_kb: i64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
            busy_timeout: Duration::from_secs(30),
            cache_size_kb: 16000,
        }
    }
}

impl PoolConfig {
    /// Create a new pool configuration with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self.min_connections = self.min_connections.min(self.max_connections);
        self
    }

    /// Configure for testing (in-memory, single connection).
    ///
    /// An in-memory database lives only as long as its connection, so the
    /// pool keeps exactly one and never recycles it.
    pub fn test() -> Self {
        Self {
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: None,
            max_lifetime: None,
            busy_timeout: Duration::from_secs(5),
            cache_size_kb: 2000,
        }
    }

    /// Build the connection options for SQLite.
    pub fn build_connect_options(&self, path: &str) -> Result<SqliteConnectOptions> {
        let options = SqliteConnectOptions::from_str(path)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
            // Comment cascades rely on this
            .foreign_keys(true)
            .pragma("cache_size", format!("-{}", self.cache_size_kb))
            .pragma("temp_store", "memory");

        Ok(options)
    }

    /// Build the pool options.
    pub fn build_pool_options(&self) -> SqlitePoolOptions {
        SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
    }
}

/// Create a pool with custom configuration.
pub async fn create_pool_with_config(path: &str, config: PoolConfig) -> Result<super::DbPool> {
    // Create parent directories if they don't exist
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let options = config.build_connect_options(path)?;
    let pool_opts = config.build_pool_options();

    let pool = pool_opts.connect_with(options).await?;

    Ok(pool)
}

/// Health check for the database connection.
pub async fn health_check(pool: &super::DbPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let pool = create_pool_with_config(":memory:", PoolConfig::test()).await.unwrap();
        health_check(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = create_pool_with_config(":memory:", PoolConfig::test()).await.unwrap();
        let (enabled,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/app.db");
        let pool = create_pool_with_config(path.to_str().unwrap(), PoolConfig::test())
            .await
            .unwrap();
        health_check(&pool).await.unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_max_connections_floor() {
        let config = PoolConfig::new().with_max_connections(0);
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.min_connections, 1);
    }
}
