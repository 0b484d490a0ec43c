//! # Vitrina Admin Library
//!
//! Wiring for the catalog admin service: storage, draft store, rate agent
//! and the command layer the dashboard calls into.
//!
//! ## Module Organization
//! ```text
//! vitrina_admin/
//! ├── lib.rs          ◄─── You are here (startup & shutdown)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── catalog.rs  ◄─── Draft store wrapper
//! │   ├── rates.rs    ◄─── Rate board + agent handle
//! │   └── config.rs   ◄─── Display settings
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   ├── product.rs  ◄─── Grid, edit, save, delete commands
//! │   └── rates.rs    ◄─── Rate status and refresh commands
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## State Management (Multiple State Types)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────────┐   │
//! │  │  CatalogState    │ │   RatesState     │ │    ConfigState       │   │
//! │  │                  │ │                  │ │                      │   │
//! │  │  • DraftStore    │ │  • RateBoard     │ │  • Number locale     │   │
//! │  │  • Dirty set     │ │  • Agent handle  │ │  • Decimals          │   │
//! │  └──────────────────┘ └──────────────────┘ └──────────────────────┘   │
//! │                                                                         │
//! │  Each command only takes the state it needs.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod state;

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use error::ApiError;
use state::{CatalogState, ConfigState, RatesState};
use vitrina_db::{Database, DbConfig};
use vitrina_sync::{
    CatalogConfig, DraftStore, FeedListenerHandle, RateAgent, RateAgentHandle, RateBoard,
    RateProvider, SqliteBackend,
};

/// A running admin service.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Service Startup                                   │
/// │                                                                         │
/// │  1. Open Database ────────────────────────────────────────────────────► │
/// │     • Configured path or platform data dir                              │
/// │     • Run pending migrations                                            │
/// │                                                                         │
/// │  2. Draft Store ──────────────────────────────────────────────────────► │
/// │     • Load products                                                     │
/// │     • Listen to the change feed                                         │
/// │                                                                         │
/// │  3. Rate Agent ───────────────────────────────────────────────────────► │
/// │     • First refresh immediately, then every refresh_interval            │
/// │                                                                         │
/// │  4. Hand out CatalogState / RatesState / ConfigState                   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub struct App {
    pub catalog: CatalogState,
    pub rates: RatesState,
    pub config: ConfigState,
    backend: SqliteBackend,
    listener: FeedListenerHandle,
    agent: RateAgentHandle,
    agent_task: JoinHandle<()>,
}

impl App {
    /// Starts every component from a loaded configuration.
    pub async fn start(config: CatalogConfig) -> Result<Self, ApiError> {
        config.validate()?;

        let db_path = config.database_path();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ApiError::internal(format!("Creating {}: {}", parent.display(), e))
            })?;
        }
        info!(?db_path, "Database path determined");

        let db = Database::new(DbConfig::new(db_path)).await?;
        info!("Database connected and migrations applied");

        let backend = SqliteBackend::new(db);
        let store = Arc::new(DraftStore::new(Arc::new(backend.clone())));
        let loaded = store.load().await?;
        let listener = store.listen();
        info!(loaded, "Draft store ready");

        let provider = RateProvider::new(&config.rates)?;
        let board = Arc::new(RateBoard::new(Arc::new(provider), config.rates.max_age()));
        let (agent_task, agent) = RateAgent::spawn(board.clone(), config.rates.refresh_interval());

        Ok(App {
            catalog: CatalogState::new(store),
            rates: RatesState::new(board, agent.clone()),
            config: ConfigState::new(config.display.clone()),
            backend,
            listener,
            agent,
            agent_task,
        })
    }

    /// Stops background tasks and closes the database.
    pub async fn shutdown(self) -> Result<(), ApiError> {
        if self.catalog.store().has_unsaved_changes() {
            warn!(
                unsaved = self.catalog.store().dirty_ids().len(),
                "Shutting down with unsaved changes"
            );
        }

        self.listener.shutdown().await?;

        // Already gone if the agent exited on its own
        let _ = self.agent.shutdown().await;
        if let Err(e) = self.agent_task.await {
            warn!(error = %e, "Rate agent task failed");
        }

        self.backend.close().await;
        info!("Vitrina admin stopped");
        Ok(())
    }
}

/// Runs the admin service until Ctrl-C.
pub async fn run() -> Result<(), ApiError> {
    init_tracing();

    info!("Starting Vitrina admin");

    let config = CatalogConfig::load(None)?;
    let app = App::start(config).await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| ApiError::internal(format!("Waiting for Ctrl-C: {}", e)))?;

    info!("Shutdown requested");
    app.shutdown().await
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=vitrina_sync=trace` - Trace the sync crate only
/// - Default: INFO, DEBUG for vitrina crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vitrina=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
