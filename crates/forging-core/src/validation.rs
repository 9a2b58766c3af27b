//! Validation utilities.

use crate::{FieldError, ForgingError};
use validator::{Validate, ValidationErrors};

/// Extension trait for validation.
pub trait ValidateExt: Validate {
    /// Validates the struct and returns a `ForgingError` on failure.
    fn validate_request(&self) -> Result<(), ForgingError> {
        self.validate().map_err(validation_errors_to_forging_error)
    }
}

impl<T: Validate> ValidateExt for T {}

/// Flattens `validator::ValidationErrors` into field errors, sorted by field.
#[must_use]
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut field_errors: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: (*field).to_string(),
                message: error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string),
                code: error.code.to_string(),
            })
        })
        .collect();
    field_errors.sort_by(|a, b| a.field.cmp(&b.field));
    field_errors
}

/// Converts `validator::ValidationErrors` to `ForgingError`.
#[must_use]
pub fn validation_errors_to_forging_error(errors: ValidationErrors) -> ForgingError {
    let message = field_errors(&errors)
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");

    ForgingError::Validation(message)
}

/// Common validation functions.
pub mod rules {
    use validator::{ValidateEmail, ValidationError};

    const MAX_PHONE_DIGITS: usize = 15;
    const MIN_PHONE_DIGITS: usize = 5;

    /// Validates that a string is not blank (not empty after trimming).
    pub fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new("not_blank"));
        }
        Ok(())
    }

    /// Validates an externally supplied user id: not blank, no surrounding whitespace.
    pub fn user_id(value: &str) -> Result<(), ValidationError> {
        not_blank(value)?;
        if value.trim() != value {
            return Err(ValidationError::new("user_id")
                .with_message("Id must not start or end with whitespace".into()));
        }
        Ok(())
    }

    /// Validates every entry of an email list.
    pub fn email_list(emails: &[String]) -> Result<(), ValidationError> {
        if emails.iter().all(|email| email.validate_email()) {
            return Ok(());
        }
        Err(ValidationError::new("email").with_message("Invalid email address".into()))
    }

    /// Validates every entry of a phone number list.
    ///
    /// Accepts an optional leading `+`, digits, spaces, dashes, dots and
    /// parentheses, with 5 to 15 digits in total.
    pub fn phone_number_list(numbers: &[String]) -> Result<(), ValidationError> {
        if numbers.iter().all(|number| is_phone_number(number)) {
            return Ok(());
        }
        Err(ValidationError::new("phone_number").with_message("Invalid phone number".into()))
    }

    /// Validates that no role name is blank.
    pub fn role_list(roles: &[String]) -> Result<(), ValidationError> {
        if roles.iter().all(|role| not_blank(role).is_ok()) {
            return Ok(());
        }
        Err(ValidationError::new("role").with_message("Role name must not be blank".into()))
    }

    fn is_phone_number(value: &str) -> bool {
        let body = value.trim();
        let body = body.strip_prefix('+').unwrap_or(body);
        let mut digits = 0;
        for c in body.chars() {
            match c {
                '0'..='9' => digits += 1,
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => return false,
            }
        }
        (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits)
    }
}
