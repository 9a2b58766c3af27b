//! Caller-facing result of a user aggregate write.

use forging_core::{ErrorResponse, FieldError, ForgingError, ForgingResult, Relation, UserAggregate, UserId};
use forging_repository::WriteResult;
use serde::Serialize;

/// What a create or replace request ended with.
///
/// This is the single place that decides the status an HTTP layer reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum Outcome {
    /// Aggregate written, returned with its assigned `joinedAt`.
    Created(UserAggregate),
    Replaced,
    NotFound { id: UserId },
    /// A child row failed to persist and the whole write was rolled back.
    PartialFailure { relation: Relation, detail: String },
    /// The request failed validation before anything was written.
    Rejected {
        detail: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        fields: Vec<FieldError>,
    },
    StorageError { detail: String },
}

impl Outcome {
    /// Maps the writer's result.
    #[must_use]
    pub fn report(result: ForgingResult<WriteResult>) -> Self {
        match result {
            Ok(WriteResult::Created(aggregate)) => Self::Created(aggregate),
            Ok(WriteResult::Replaced) => Self::Replaced,
            Ok(WriteResult::NotFound { id }) => Self::NotFound { id },
            Ok(WriteResult::PartialFailure(failure)) => Self::PartialFailure {
                relation: failure.relation,
                detail: failure.to_string(),
            },
            Err(error) => Self::from(error),
        }
    }

    /// Builds a rejection from field-level validation errors.
    #[must_use]
    pub fn rejected(fields: Vec<FieldError>) -> Self {
        let detail = fields
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        Self::Rejected { detail, fields }
    }

    /// HTTP status equivalent.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Created(_) => 201,
            Self::Replaced => 204,
            Self::NotFound { .. } => 404,
            Self::PartialFailure { .. } | Self::Rejected { .. } => 400,
            Self::StorageError { .. } => 500,
        }
    }

    /// Machine-readable code, `None` on success.
    #[must_use]
    pub const fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::Created(_) | Self::Replaced => None,
            Self::NotFound { .. } => Some("NOT_FOUND"),
            Self::PartialFailure { .. } => Some("PARTIAL_FAILURE"),
            Self::Rejected { .. } => Some("VALIDATION_ERROR"),
            Self::StorageError { .. } => Some("STORAGE_ERROR"),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Created(_) | Self::Replaced)
    }

    /// Text an HTTP layer puts in the response body.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Created(aggregate) => format!("User {} created", aggregate.id),
            Self::Replaced => "User replaced".to_string(),
            Self::NotFound { id } => format!("User {id} not found"),
            Self::PartialFailure { detail, .. }
            | Self::Rejected { detail, .. }
            | Self::StorageError { detail } => detail.clone(),
        }
    }

    /// Error body for failed outcomes.
    #[must_use]
    pub fn error_response(&self) -> Option<ErrorResponse> {
        let code = self.error_code()?;
        let response = ErrorResponse::new(code, self.message());
        Some(match self {
            Self::Rejected { fields, .. } if !fields.is_empty() => {
                response.with_details(fields.clone())
            }
            _ => response,
        })
    }
}

impl From<ForgingError> for Outcome {
    fn from(error: ForgingError) -> Self {
        match error {
            ForgingError::Validation(detail) => Self::Rejected {
                detail,
                fields: Vec::new(),
            },
            other => Self::StorageError {
                detail: other.to_string(),
            },
        }
    }
}

impl From<ForgingResult<WriteResult>> for Outcome {
    fn from(result: ForgingResult<WriteResult>) -> Self {
        Self::report(result)
    }
}
