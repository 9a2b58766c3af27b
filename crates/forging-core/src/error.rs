//! Unified error types for all layers of the application.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for Forging.
///
/// Business outcomes of a write (not-found on replace, a child row that
/// failed to persist) are not errors; they travel as values. This enum covers
/// request validation and everything that goes wrong underneath.
#[derive(Error, Debug)]
pub enum ForgingError {
    // ============ Domain Errors ============
    /// Resource not found
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unique constraint violation (duplicate key)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Foreign-key, not-null or check constraint violation
    #[error("Constraint violation: {0}")]
    Constraint(String),

    // ============ Infrastructure Errors ============
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ForgingError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::Timeout(_) => 503,
            Self::Constraint(_)
            | Self::Database(_)
            | Self::Configuration(_)
            | Self::Internal(_)
            | Self::Other(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Constraint(_) => "CONSTRAINT_VIOLATION",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict<T: Into<String>>(message: T) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates a database error.
    #[must_use]
    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Checks if this error is retriable.
    ///
    /// Nothing in the write path retries on its own; callers use this to
    /// decide whether resubmitting the same request can help.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Timeout(_))
    }

    /// Checks if this error was raised by a store-level integrity constraint
    /// on a single row.
    #[must_use]
    pub const fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Constraint(_))
    }
}

/// PostgreSQL SQLSTATE codes for integrity constraint violations.
#[cfg(feature = "sqlx")]
const UNIQUE_VIOLATION: &str = "23505";
#[cfg(feature = "sqlx")]
const FOREIGN_KEY_VIOLATION: &str = "23503";
#[cfg(feature = "sqlx")]
const NOT_NULL_VIOLATION: &str = "23502";
#[cfg(feature = "sqlx")]
const CHECK_VIOLATION: &str = "23514";

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for ForgingError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound {
                resource_type: "database_row",
                id: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => Self::Conflict(db_err.message().to_string()),
                Some(FOREIGN_KEY_VIOLATION | NOT_NULL_VIOLATION | CHECK_VIOLATION) => {
                    Self::Constraint(db_err.message().to_string())
                }
                _ => Self::Database(err.to_string()),
            },
            sqlx::Error::PoolTimedOut => Self::Timeout(err.to_string()),
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ForgingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {}", err))
    }
}

/// Serializable error response for API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional field-level errors for validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-level validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
}

impl ErrorResponse {
    /// Creates a new error response from a code and message.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new error response from a `ForgingError`.
    #[must_use]
    pub fn from_error(error: &ForgingError) -> Self {
        Self::new(error.error_code(), error.to_string())
    }

    /// Sets field-level validation errors.
    #[must_use]
    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<&ForgingError> for ErrorResponse {
    fn from(error: &ForgingError) -> Self {
        Self::from_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ForgingError::not_found("User", "u1").status_code(), 404);
        assert_eq!(ForgingError::validation("empty id").status_code(), 400);
        assert_eq!(ForgingError::conflict("duplicate").status_code(), 409);
        assert_eq!(ForgingError::Constraint("fk".to_string()).status_code(), 500);
        assert_eq!(ForgingError::database("connection lost").status_code(), 500);
        assert_eq!(ForgingError::Timeout("pool".to_string()).status_code(), 503);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ForgingError::not_found("User", "u1").error_code(), "NOT_FOUND");
        assert_eq!(ForgingError::validation("bad").error_code(), "VALIDATION_ERROR");
        assert_eq!(ForgingError::conflict("dup").error_code(), "CONFLICT");
        assert_eq!(
            ForgingError::Constraint("fk".to_string()).error_code(),
            "CONSTRAINT_VIOLATION"
        );
        assert_eq!(ForgingError::database("db").error_code(), "DATABASE_ERROR");
        assert_eq!(ForgingError::internal("oops").error_code(), "INTERNAL_ERROR");
        assert_eq!(
            ForgingError::Other(anyhow::anyhow!("wrapped")).error_code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_retriable_errors() {
        assert!(ForgingError::database("connection reset").is_retriable());
        assert!(ForgingError::Timeout("pool timed out".to_string()).is_retriable());
        assert!(!ForgingError::conflict("dup").is_retriable());
        assert!(!ForgingError::validation("bad").is_retriable());
    }

    #[test]
    fn test_constraint_violations() {
        assert!(ForgingError::conflict("duplicate key").is_constraint_violation());
        assert!(ForgingError::Constraint("fk".to_string()).is_constraint_violation());
        assert!(!ForgingError::database("connection reset").is_constraint_violation());
        assert!(!ForgingError::not_found("User", "u1").is_constraint_violation());
    }

    #[test]
    fn test_error_display() {
        let err = ForgingError::not_found("User", "u1");
        assert_eq!(err.to_string(), "Resource not found: User with id u1");

        let err = ForgingError::database("connection reset");
        assert_eq!(err.to_string(), "Database error: connection reset");
    }

    #[test]
    fn test_error_response_from_error() {
        let err = ForgingError::validation("id: must not be empty");
        let response = ErrorResponse::from_error(&err);
        assert_eq!(response.code, "VALIDATION_ERROR");
        assert!(response.message.contains("must not be empty"));
        assert!(response.details.is_none());
    }

    #[test]
    fn test_error_response_with_details() {
        let details = vec![FieldError {
            field: "emails".to_string(),
            message: "Invalid email address".to_string(),
            code: "email".to_string(),
        }];
        let response = ErrorResponse::new("VALIDATION_ERROR", "bad input").with_details(details);
        assert_eq!(response.details.map(|d| d.len()), Some(1));
    }
}
