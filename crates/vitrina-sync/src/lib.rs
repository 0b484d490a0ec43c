//! # vitrina-sync: Rates, Drafts and Change Feed for Vitrina
//!
//! Everything that talks to the outside world or tracks unsaved work.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Sync Layer                                      │
//! │                                                                         │
//! │  ┌────────────────┐   refresh_all   ┌────────────────┐                 │
//! │  │   RateAgent    │ ──────────────► │   RateBoard    │                 │
//! │  │ interval + on  │                 │ last-known,    │                 │
//! │  │ demand         │                 │ loading flags, │                 │
//! │  └────────────────┘                 │ staleness cap  │                 │
//! │                                     └───────┬────────┘                 │
//! │                                             │ RateSource               │
//! │                                     ┌───────▼────────┐                 │
//! │                                     │  RateProvider  │──► BCV endpoint │
//! │                                     │   (reqwest)    │──► USDT endpoint│
//! │                                     └────────────────┘                 │
//! │                                                                         │
//! │  ┌────────────────┐  ProductBackend ┌────────────────┐                 │
//! │  │   DraftStore   │ ──────────────► │ SqliteBackend  │──► vitrina-db   │
//! │  │ dirty set,     │                 │                │                 │
//! │  │ save_all,      │ ◄────────────── │  ChangeFeed    │                 │
//! │  │ draft ids      │  Subscription   │  (broadcast)   │                 │
//! │  └────────────────┘                 └────────────────┘                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`config`] - `CatalogConfig` (TOML + env)
//! - [`error`] - Sync, rate, persistence and draft errors
//! - [`rates`] - HTTP rate provider and the `RateSource` trait
//! - [`rate_board`] - Last-known rates with loading flags
//! - [`agent`] - Background refresh loop
//! - [`feed`] - Change feed (subscribe / dispose)
//! - [`backend`] - `ProductBackend` trait and `SqliteBackend`
//! - [`drafts`] - `DraftStore`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vitrina_sync::{CatalogConfig, DraftStore, RateAgent, RateBoard, RateProvider, SqliteBackend};
//!
//! let config = CatalogConfig::load_or_default(None);
//!
//! let provider = Arc::new(RateProvider::new(&config.rates)?);
//! let board = Arc::new(RateBoard::new(provider, config.rates.max_age()));
//! let (_task, agent) = RateAgent::spawn(board.clone(), config.rates.refresh_interval());
//!
//! let store = Arc::new(DraftStore::new(Arc::new(SqliteBackend::new(database))));
//! store.load().await?;
//! let listener = store.listen();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod agent;
pub mod backend;
pub mod config;
pub mod drafts;
pub mod error;
pub mod feed;
pub mod rate_board;
pub mod rates;

// =============================================================================
// Re-exports
// =============================================================================

pub use agent::{AgentCommand, RateAgent, RateAgentHandle};
pub use backend::{PersistenceResult, ProductBackend, SqliteBackend};
pub use config::{CatalogConfig, DisplaySettings, RateSettings, StoreSettings};
pub use drafts::{
    DirtySet, DraftStore, FeedListenerHandle, Promotion, RecordState, RemoteOutcome,
    SaveFailure, SaveReport,
};
pub use error::{DraftError, PersistenceError, RateFetchError, SyncError, SyncResult};
pub use feed::{ChangeEvent, ChangeFeed, ChangeKind, Subscription};
pub use rate_board::{RateBoard, RateSlot};
pub use rates::{RateProvider, RateSource};
