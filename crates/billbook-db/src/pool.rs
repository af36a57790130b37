//! # Database Handle
//!
//! Opens the SQLite book and hands out one repository per collection.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BookConfig::load()                                                    │
//! │       │  [database] path, max_connections                              │
//! │       ▼                                                                 │
//! │  DbConfig { location: File(path) | Memory, ... }                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config)                                                 │
//! │       ├── connect options (WAL, NORMAL sync, no FK enforcement)        │
//! │       ├── SqlitePool                                                   │
//! │       └── embedded migrations                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.parties() │ products() │ invoices() │ transactions() │ returns()   │
//! │  (each handle clones the pool; no connection is held between calls)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Collections reference each other by id only. A return may outlive the
//! invoice it names, so foreign keys are left unenforced.
//!
//! An in-memory book lives exactly as long as its single connection, so the
//! pool for [`DbLocation::Memory`] never reaps or recycles it.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::{
    InvoiceRepository, PartyRepository, ProductRepository, ReturnRepository, TransactionRepository,
};

// =============================================================================
// Configuration
// =============================================================================

/// Where the book is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    /// A SQLite file, created on first open.
    File(PathBuf),
    /// A private in-memory database (tests, throwaway demos).
    Memory,
}

impl std::fmt::Display for DbLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbLocation::File(path) => write!(f, "{}", path.display()),
            DbLocation::Memory => write!(f, ":memory:"),
        }
    }
}

/// Pool settings.
///
/// ```rust,ignore
/// let config = DbConfig::new("./data/billbook.db").max_connections(2);
/// let db = Database::new(config).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: DbLocation,

    /// Default: 5. Forced to 1 for in-memory books.
    pub max_connections: u32,

    /// How long an operation waits for a free connection. Default: 30 seconds
    pub acquire_timeout: Duration,

    /// Apply pending migrations on open. Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: DbLocation::File(path.into()),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            run_migrations: true,
        }
    }

    /// A fresh, empty book that disappears when the [`Database`] is dropped.
    pub fn in_memory() -> Self {
        DbConfig {
            location: DbLocation::Memory,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.location {
            DbLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal),
            DbLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };

        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(false))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().acquire_timeout(self.acquire_timeout);

        match self.location {
            DbLocation::File(_) => options
                .max_connections(self.max_connections.max(1))
                .idle_timeout(Some(Duration::from_secs(600))),
            DbLocation::Memory => options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle to the book. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the book and, unless disabled, migrates it to the current schema.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(location = %config.location, "Opening book");

        if let DbLocation::File(path) = &config.location {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
            }
        }

        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(max_connections = config.max_connections, "Pool created");

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Already-applied ones are skipped.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Raw pool, for diagnostics queries the repositories do not cover.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn parties(&self) -> PartyRepository {
        PartyRepository::new(self.pool.clone())
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn invoices(&self) -> InvoiceRepository {
        InvoiceRepository::new(self.pool.clone())
    }

    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.pool.clone())
    }

    pub fn returns(&self) -> ReturnRepository {
        ReturnRepository::new(self.pool.clone())
    }

    /// Closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing book");
        self.pool.close().await;
    }

    /// `true` when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::migration_status;
    use crate::repository::EntityStore;

    #[tokio::test]
    async fn test_in_memory_book_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        let (total, applied) = migration_status(db.pool()).await.unwrap();
        assert!(total >= 1);
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_in_memory_books_are_isolated() {
        let first = Database::new(DbConfig::in_memory()).await.unwrap();
        let second = Database::new(DbConfig::in_memory()).await.unwrap();

        sqlx::query("INSERT INTO parties (id, name, party_type, mobile, address, created_at) VALUES ('p1', 'A', 'customer', '', '', '2026-03-01T00:00:00Z')")
            .execute(first.pool())
            .await
            .unwrap();

        assert_eq!(first.parties().count().await.unwrap(), 1);
        assert!(second.parties().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_book_creates_parent_directory() {
        let dir = std::env::temp_dir().join(format!("billbook-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("book.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert!(db.health_check().await);
        db.close().await;

        assert!(path.exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/billbook-test.db")
            .max_connections(2)
            .run_migrations(false);

        assert_eq!(config.location, DbLocation::File(PathBuf::from("/tmp/billbook-test.db")));
        assert_eq!(config.max_connections, 2);
        assert!(!config.run_migrations);
        assert_eq!(DbConfig::in_memory().location.to_string(), ":memory:");
    }
}
