//! Child relations of the user aggregate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the dependent child collections of a user.
///
/// The declaration order is the order in which child sets are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Relation {
    /// Rows in `user_emails`.
    Emails,
    /// Rows in `user_phone_numbers`.
    PhoneNumbers,
    /// Rows in `user_roles`, each referencing a row of `roles`.
    Roles,
}

impl Relation {
    /// All relations in write order.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Emails, Self::PhoneNumbers, Self::Roles]
    }

    /// Singular noun for one row of this relation, used in failure messages.
    #[must_use]
    pub const fn item_name(&self) -> &'static str {
        match self {
            Self::Emails => "email",
            Self::PhoneNumbers => "phone number",
            Self::Roles => "role",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Emails => write!(f, "emails"),
            Self::PhoneNumbers => write!(f, "phone numbers"),
            Self::Roles => write!(f, "roles"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_order() {
        assert_eq!(
            Relation::all(),
            [Relation::Emails, Relation::PhoneNumbers, Relation::Roles]
        );
    }

    #[test]
    fn test_display_and_item_name() {
        assert_eq!(Relation::PhoneNumbers.to_string(), "phone numbers");
        assert_eq!(Relation::PhoneNumbers.item_name(), "phone number");
        assert_eq!(Relation::Roles.item_name(), "role");
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&Relation::PhoneNumbers).unwrap(),
            "\"phoneNumbers\""
        );
    }
}
