//! # Sync Error Types
//!
//! Error types for rate fetching, persistence and the draft store.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  SyncError      │  │ RateFetchError  │  │  PersistenceError       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Http           │  │  NotFound               │ │
//! │  │  InvalidUrl     │  │  Transport      │  │  Rejected               │ │
//! │  │  ConfigLoad/Save│  │  Timeout        │  │  Unavailable            │ │
//! │  │  ChannelError   │  │  MissingField   │  │                         │ │
//! │  │                 │  │  (silent: kept  │  │  (explicit: surfaced    │ │
//! │  │                 │  │   stale value)  │  │   to the admin)         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  DraftError: UnknownProduct, Validation, BatchFailed,           │   │
//! │  │              DeleteFailed, LoadFailed                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use vitrina_core::{ProductId, RateKind, ValidationError};
use vitrina_db::DbError;

use crate::drafts::SaveReport;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

// =============================================================================
// Sync Error
// =============================================================================

/// Setup and plumbing failures.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid endpoint URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Background task is gone.
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl SyncError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}

// =============================================================================
// Rate Fetch Error
// =============================================================================

/// A rate endpoint could not produce a usable number.
///
/// Never shown to the admin as an error: the rate board keeps the previous
/// value and only flags the rate as "could not refresh".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateFetchError {
    #[error("{kind} rate endpoint returned HTTP {status}")]
    Http { kind: RateKind, status: u16 },

    #[error("{kind} rate request failed: {message}")]
    Transport { kind: RateKind, message: String },

    #[error("{kind} rate request timed out")]
    Timeout { kind: RateKind },

    #[error("{kind} rate response has no numeric '{field}'")]
    MissingField { kind: RateKind, field: String },

    #[error("{kind} rate response is not valid JSON: {message}")]
    Decode { kind: RateKind, message: String },

    #[error("{kind} rate value {value} is not a valid rate")]
    InvalidValue { kind: RateKind, value: f64 },
}

impl RateFetchError {
    /// Which rate failed.
    pub fn kind(&self) -> RateKind {
        match self {
            RateFetchError::Http { kind, .. }
            | RateFetchError::Transport { kind, .. }
            | RateFetchError::Timeout { kind }
            | RateFetchError::MissingField { kind, .. }
            | RateFetchError::Decode { kind, .. }
            | RateFetchError::InvalidValue { kind, .. } => *kind,
        }
    }
}

// =============================================================================
// Persistence Error
// =============================================================================

/// A create, update or delete against the backend failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// The record is gone.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend refused the data (validation, constraint, bad key).
    #[error("Rejected by backend: {0}")]
    Rejected(String),

    /// The backend could not be reached or failed internally.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl From<DbError> for PersistenceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => {
                PersistenceError::NotFound(format!("{} {}", entity, id))
            }
            DbError::Validation(_) | DbError::ConstraintViolation(_) | DbError::CorruptRow { .. } => {
                PersistenceError::Rejected(err.to_string())
            }
            other => PersistenceError::Unavailable(other.to_string()),
        }
    }
}

// =============================================================================
// Draft Error
// =============================================================================

/// Failures surfaced by the draft store.
#[derive(Debug, Error)]
pub enum DraftError {
    /// No product with this id is in the local list.
    #[error("Product {0} is not in the catalog")]
    UnknownProduct(ProductId),

    /// Cell text rejected at the input boundary.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Some products in a save pass could not be persisted.
    ///
    /// Carries the full report so callers still see what succeeded.
    #[error("{} of {} products could not be saved", .0.failures.len(), .0.attempted())]
    BatchFailed(SaveReport),

    /// Remote delete failed; the product was put back in the list.
    #[error("Could not delete product {id}: {source}")]
    DeleteFailed {
        id: ProductId,
        #[source]
        source: PersistenceError,
    },

    /// The initial product list could not be fetched.
    #[error("Could not load products: {0}")]
    LoadFailed(#[source] PersistenceError),
}
