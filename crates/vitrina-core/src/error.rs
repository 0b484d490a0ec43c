//! # Error Types
//!
//! Domain-specific error types for vitrina-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vitrina-core errors (this file)                                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vitrina-db errors                                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  vitrina-sync errors                                                   │
//! │  ├── RateFetchError   - Rate endpoint failures (silently degraded)     │
//! │  ├── PersistenceError - Backend create/update/delete failures          │
//! │  └── DraftError       - Draft store failures surfaced to the user      │
//! │                                                                         │
//! │  Admin API errors                                                      │
//! │  └── ApiError         - What the dashboard sees (serialized)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised synchronously at the input boundary, before a value reaches the
/// calculator or the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Collection has too many entries.
    #[error("{field} cannot have more than {max} entries")]
    TooMany { field: String, max: usize },

    /// Invalid format (e.g., "12a", "1.2.3" in a numeric cell).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "nombre".to_string(),
        };
        assert_eq!(err.to_string(), "nombre is required");

        let err = ValidationError::TooMany {
            field: "images".to_string(),
            max: 3,
        };
        assert_eq!(err.to_string(), "images cannot have more than 3 entries");
    }
}
