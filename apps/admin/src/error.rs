//! # API Error Type
//!
//! Unified error type for admin commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Vitrina Admin                          │
//! │                                                                         │
//! │  Dashboard                   Rust Backend                               │
//! │  ─────────                   ────────────                               │
//! │                                                                         │
//! │  save_all()                                                             │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Cell text rejected? ─── ValidationError ──────────┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Some saves failed? ─── DraftError::BatchFailed ── ApiError ───►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  Persistence failures are always explicit: they are lost work if       │
//! │  ignored. Rate failures never reach this type.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;
use vitrina_core::ValidationError;
use vitrina_db::DbError;
use vitrina_sync::{DraftError, PersistenceError, SyncError};

/// API error returned from admin commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "PARTIAL_SAVE",
///   "message": "1 of 3 products could not be saved: #2 (Backend unavailable: timeout)"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code:?}] {message}")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Database operation failed (500)
    DatabaseError,

    /// A create/update/delete was refused or could not reach the backend
    PersistenceError,

    /// Some products in a save pass failed; the rest were saved
    PartialSave,

    /// Configuration could not be loaded or is invalid
    ConfigError,

    /// Internal server error (500)
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::Validation(e) => ApiError::validation(e.to_string()),
            DbError::ConstraintViolation(message) | DbError::CorruptRow { reason: message, .. } => {
                tracing::error!("Rejected by database: {}", message);
                ApiError::new(ErrorCode::DatabaseError, "Stored data is invalid")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound(what) => ApiError::new(ErrorCode::NotFound, what),
            other => ApiError::new(ErrorCode::PersistenceError, other.to_string()),
        }
    }
}

/// Converts draft-store errors to API errors.
impl From<DraftError> for ApiError {
    fn from(err: DraftError) -> Self {
        match err {
            DraftError::UnknownProduct(id) => ApiError::not_found("Product", id),
            DraftError::Validation(e) => e.into(),
            DraftError::BatchFailed(ref report) => {
                let failed = report
                    .failures
                    .iter()
                    .map(|f| format!("#{} ({})", f.id, f.error))
                    .collect::<Vec<_>>()
                    .join(", ");
                ApiError::new(ErrorCode::PartialSave, format!("{}: {}", err, failed))
            }
            DraftError::DeleteFailed { .. } | DraftError::LoadFailed(_) => {
                ApiError::new(ErrorCode::PersistenceError, err.to_string())
            }
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        if err.is_config_error() {
            ApiError::new(ErrorCode::ConfigError, err.to_string())
        } else {
            ApiError::internal(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrina_sync::{SaveFailure, SaveReport};

    #[test]
    fn test_serialized_shape() {
        let err = ApiError::not_found("Product", 42);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Product not found: 42");
    }

    #[test]
    fn test_batch_failure_lists_failed_ids() {
        let report = SaveReport {
            saved: vec![1, 3],
            failures: vec![SaveFailure {
                id: 2,
                error: PersistenceError::Unavailable("timeout".into()),
            }],
            ..Default::default()
        };

        let err: ApiError = DraftError::BatchFailed(report).into();
        assert_eq!(err.code, ErrorCode::PartialSave);
        assert!(err.message.starts_with("1 of 3 products could not be saved"));
        assert!(err.message.contains("#2"));
    }

    #[test]
    fn test_delete_failure_is_persistence_error() {
        let err: ApiError = DraftError::DeleteFailed {
            id: 42,
            source: PersistenceError::Unavailable("offline".into()),
        }
        .into();
        assert_eq!(err.code, ErrorCode::PersistenceError);
        assert!(err.message.contains("42"));
    }

    #[test]
    fn test_config_errors() {
        let err: ApiError = SyncError::InvalidUrl("nope".into()).into();
        assert_eq!(err.code, ErrorCode::ConfigError);
    }
}
