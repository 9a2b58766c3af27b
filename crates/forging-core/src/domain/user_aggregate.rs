//! User aggregate: one `users` row plus its email, phone number and role rows.

use super::Relation;
use crate::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// The replaceable part of a user aggregate.
///
/// A replace overwrites every field here together: the parent scalars and all
/// three child collections. There is no partial update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: String,
    /// Email addresses in the order supplied.
    pub emails: Vec<String>,
    /// Phone numbers in the order supplied.
    pub phone_numbers: Vec<String>,
    /// Role names; a set, first occurrence wins.
    #[serde(deserialize_with = "deserialize_role_set")]
    pub roles: Vec<String>,
}

impl UserDetails {
    /// Creates user details, collapsing repeated role names.
    #[must_use]
    pub fn new(
        username: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
        image_url: String,
        emails: Vec<String>,
        phone_numbers: Vec<String>,
        roles: Vec<String>,
    ) -> Self {
        Self {
            username,
            first_name,
            last_name,
            image_url,
            emails,
            phone_numbers,
            roles: dedup_preserving_order(roles),
        }
    }

    /// Returns the values of one child relation.
    #[must_use]
    pub fn children(&self, relation: Relation) -> &[String] {
        match relation {
            Relation::Emails => &self.emails,
            Relation::PhoneNumbers => &self.phone_numbers,
            Relation::Roles => &self.roles,
        }
    }
}

/// A complete user aggregate as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAggregate {
    pub id: UserId,
    #[serde(flatten)]
    pub details: UserDetails,
    /// Set once when the aggregate is created; replace never touches it.
    pub joined_at: DateTime<Utc>,
}

impl UserAggregate {
    /// Creates a new aggregate joined now.
    #[must_use]
    pub fn new(id: UserId, details: UserDetails) -> Self {
        Self::joined_at(id, details, Utc::now())
    }

    /// Creates an aggregate with an explicit join timestamp.
    #[must_use]
    pub fn joined_at(id: UserId, details: UserDetails, joined_at: DateTime<Utc>) -> Self {
        Self {
            id,
            details,
            joined_at,
        }
    }
}

fn deserialize_role_set<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Vec::<String>::deserialize(deserializer).map(dedup_preserving_order)
}

fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(values.len());
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(emails: &[&str], roles: &[&str]) -> UserDetails {
        UserDetails::new(
            Some("jdoe".to_string()),
            Some("John".to_string()),
            None,
            "https://img.example.com/u1.png".to_string(),
            emails.iter().map(ToString::to_string).collect(),
            vec![],
            roles.iter().map(ToString::to_string).collect(),
        )
    }

    #[test]
    fn test_roles_are_a_set() {
        let details = details(&[], &["User", "Admin", "User"]);
        assert_eq!(details.roles, vec!["User".to_string(), "Admin".to_string()]);
    }

    #[test]
    fn test_emails_keep_order_and_duplicates() {
        let details = details(&["b@x.com", "a@x.com", "b@x.com"], &[]);
        assert_eq!(details.emails.len(), 3);
        assert_eq!(details.emails[0], "b@x.com");
    }

    #[test]
    fn test_children_by_relation() {
        let details = details(&["a@x.com"], &["User"]);
        assert_eq!(details.children(Relation::Emails), ["a@x.com".to_string()]);
        assert!(details.children(Relation::PhoneNumbers).is_empty());
        assert_eq!(details.children(Relation::Roles), ["User".to_string()]);
    }

    #[test]
    fn test_deserialized_roles_are_a_set() {
        let user: UserAggregate = serde_json::from_str(
            r#"{
                "id": "u1",
                "username": null,
                "firstName": null,
                "lastName": null,
                "imageUrl": "https://img.example.com/u1.png",
                "emails": [],
                "phoneNumbers": [],
                "roles": ["User", "Admin", "User"],
                "joinedAt": "2024-01-01T00:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(user.details.roles, vec!["User".to_string(), "Admin".to_string()]);
    }

    #[test]
    fn test_serializes_flat_camel_case() {
        let user = UserAggregate::new(UserId::parse("u1").unwrap(), details(&["a@x.com"], &[]));
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], "u1");
        assert_eq!(json["firstName"], "John");
        assert_eq!(json["emails"][0], "a@x.com");
        assert!(json["phoneNumbers"].as_array().unwrap().is_empty());
        assert!(json.get("joinedAt").is_some());
    }
}
