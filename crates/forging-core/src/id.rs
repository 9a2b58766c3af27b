//! Typed ID wrappers for domain entities.

use crate::ForgingError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use uuid::Uuid;

/// Externally supplied, stable identity of a user aggregate.
///
/// The value comes from the identity provider and is never generated here.
/// It is stored exactly as supplied: never empty and never padded with
/// whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Parses a user ID, rejecting empty input and surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, ForgingError> {
        if s.trim().is_empty() {
            return Err(ForgingError::validation("id: must not be empty"));
        }
        if s.trim() != s {
            return Err(ForgingError::validation(
                "id: must not start or end with whitespace",
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = ForgingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of a single child row (email, phone number, role assignment).
///
/// Generated fresh for every inserted row and never exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChildRowId(pub Uuid);

impl ChildRowId {
    /// Creates a new time-ordered row ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ChildRowId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ChildRowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
