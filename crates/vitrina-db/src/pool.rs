//! # Database Pool Management
//!
//! Opens the catalog database and hands out repositories.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Lifecycle                                 │
//! │                                                                         │
//! │  Admin service startup                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path)            DbConfig::in_memory()  (tests)         │
//! │       │                                │                                │
//! │       └───────────────┬────────────────┘                                │
//! │                       ▼                                                 │
//! │  Database::new(config).await ← pool + migrations                       │
//! │                       │                                                 │
//! │                       ▼                                                 │
//! │  SqliteBackend (vitrina-sync) owns the handle                          │
//! │                       │                                                 │
//! │                       ▼                                                 │
//! │  Database::close().await ← on shutdown                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Workload
//! One admin writes, one product at a time, while the grid and the public
//! catalog read. A file database therefore runs in WAL mode so readers never
//! wait on a save pass, and a writer that does collide waits out
//! `busy_timeout` instead of failing the save with `SQLITE_BUSY`.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::product::ProductRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the catalog lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    /// SQLite file, created on first open.
    File(PathBuf),
    /// Private in-memory database, gone when the pool closes.
    Memory,
}

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/vitrina/vitrina.db")
///     .busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: DbLocation,

    /// Pool size. A handful covers the grid, the public list and one writer.
    pub max_connections: u32,

    /// How long a write waits on a locked database. Default: 5 seconds
    pub busy_timeout: Duration,

    /// How long to wait for a free pooled connection. Default: 10 seconds
    pub acquire_timeout: Duration,

    /// Whether to run migrations on connect. Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Configuration for a file database.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: DbLocation::File(path.into()),
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(10),
            run_migrations: true,
        }
    }

    /// Isolated in-memory database for tests.
    pub fn in_memory() -> Self {
        DbConfig {
            location: DbLocation::Memory,
            // Every connection would get its own empty database
            max_connections: 1,
            ..DbConfig::new(PathBuf::new())
        }
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.location {
            DbLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
            DbLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };

        Ok(options.busy_timeout(self.busy_timeout).foreign_keys(true))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cheap to clone: clones share the same pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::in_memory()).await?;
/// let id = db.products().insert(&draft).await?.id;
/// db.products().delete(id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, if configured, applies pending migrations.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(location = ?config.location, "Opening catalog database");

        let options = config.connect_options()?;
        debug!(busy_timeout_ms = config.busy_timeout.as_millis() as u64, "Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the product repository.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Closes the pool. Every later operation fails.
    pub async fn close(&self) {
        info!("Closing catalog database");
        self.pool.close().await;
    }
}
