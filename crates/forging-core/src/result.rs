//! Result type aliases for Forging.

use crate::ForgingError;

/// A specialized `Result` type for Forging operations.
pub type ForgingResult<T> = Result<T, ForgingError>;
