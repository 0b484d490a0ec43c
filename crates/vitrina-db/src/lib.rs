//! # vitrina-db: Product Storage for Vitrina
//!
//! SQLite-backed persistence for the product catalog, using sqlx for async
//! operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vitrina Data Flow                                │
//! │                                                                         │
//! │  DraftStore::save_all (vitrina-sync)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SqliteBackend ── publishes ChangeEvent after each write               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    vitrina-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repository   │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ (product.rs)  │    │  (embedded)  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (vitrina.db)                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vitrina_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("vitrina.db")).await?;
//! let catalog = db.products().list_active().await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DbLocation};
pub use repository::product::ProductRepository;
