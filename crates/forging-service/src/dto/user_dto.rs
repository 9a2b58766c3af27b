//! User aggregate request DTOs.

use forging_core::validation::rules;
use forging_core::{ForgingResult, UserAggregate, UserDetails, UserId};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to create a user aggregate.
///
/// `email` and `phoneNumber` are accepted as aliases of the list fields.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(custom(function = "rules::user_id"))]
    pub id: String,

    #[validate(length(max = 64, message = "Username cannot exceed 64 characters"))]
    pub username: Option<String>,

    #[validate(length(max = 64))]
    pub first_name: Option<String>,

    #[validate(length(max = 64))]
    pub last_name: Option<String>,

    #[validate(url(message = "Invalid image URL"))]
    pub image_url: String,

    #[serde(default, alias = "email")]
    #[validate(custom(function = "rules::email_list"))]
    pub emails: Vec<String>,

    #[serde(default, alias = "phoneNumber")]
    #[validate(custom(function = "rules::phone_number_list"))]
    pub phone_numbers: Vec<String>,

    #[serde(default)]
    #[validate(custom(function = "rules::role_list"))]
    pub roles: Vec<String>,
}

impl CreateUserRequest {
    /// Converts the request into a new aggregate joined now.
    ///
    /// # Errors
    ///
    /// Returns `ForgingError::Validation` when the id is blank or padded.
    pub fn into_aggregate(self) -> ForgingResult<UserAggregate> {
        let id = UserId::parse(&self.id)?;
        let details = UserDetails::new(
            self.username,
            self.first_name,
            self.last_name,
            self.image_url,
            self.emails,
            self.phone_numbers,
            self.roles,
        );
        Ok(UserAggregate::new(id, details))
    }
}

/// Request to replace a user aggregate. Every field is overwritten.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceUserRequest {
    #[validate(length(max = 64, message = "Username cannot exceed 64 characters"))]
    pub username: Option<String>,

    #[validate(length(max = 64))]
    pub first_name: Option<String>,

    #[validate(length(max = 64))]
    pub last_name: Option<String>,

    #[validate(url(message = "Invalid image URL"))]
    pub image_url: String,

    #[serde(default, alias = "email")]
    #[validate(custom(function = "rules::email_list"))]
    pub emails: Vec<String>,

    #[serde(default, alias = "phoneNumber")]
    #[validate(custom(function = "rules::phone_number_list"))]
    pub phone_numbers: Vec<String>,

    #[serde(default)]
    #[validate(custom(function = "rules::role_list"))]
    pub roles: Vec<String>,
}

impl From<ReplaceUserRequest> for UserDetails {
    fn from(request: ReplaceUserRequest) -> Self {
        Self::new(
            request.username,
            request.first_name,
            request.last_name,
            request.image_url,
            request.emails,
            request.phone_numbers,
            request.roles,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forging_core::{ForgingError, ValidateExt};

    #[test]
    fn test_create_request_accepts_camel_case_and_aliases() {
        let request: CreateUserRequest = serde_json::from_str(
            r#"{
                "id": "user_2abc",
                "username": "jdoe",
                "firstName": "John",
                "imageUrl": "https://img.example.com/u.png",
                "email": ["a@x.com"],
                "phoneNumber": ["+15550100"]
            }"#,
        )
        .unwrap();

        assert_eq!(request.first_name.as_deref(), Some("John"));
        assert_eq!(request.emails, vec!["a@x.com"]);
        assert_eq!(request.phone_numbers, vec!["+15550100"]);
        assert!(request.roles.is_empty());
        assert!(request.validate_request().is_ok());
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let request: ReplaceUserRequest =
            serde_json::from_str(r#"{"imageUrl": "https://img.example.com/u.png"}"#).unwrap();
        let details = UserDetails::from(request);
        assert!(details.emails.is_empty());
        assert!(details.phone_numbers.is_empty());
        assert!(details.roles.is_empty());
    }

    #[test]
    fn test_invalid_fields_are_rejected() {
        let request = CreateUserRequest {
            id: "  ".to_string(),
            username: None,
            first_name: None,
            last_name: None,
            image_url: "not a url".to_string(),
            emails: vec!["nope".to_string()],
            phone_numbers: vec![],
            roles: vec![],
        };

        let err = request.validate_request().unwrap_err();
        let ForgingError::Validation(message) = err else {
            panic!("expected a validation error");
        };
        assert!(message.contains("emails: Invalid email address"));
        assert!(message.contains("id: not_blank"));
        assert!(message.contains("image_url: Invalid image URL"));
    }

    #[test]
    fn test_into_aggregate_keeps_id_and_dedups_roles() {
        let request = CreateUserRequest {
            id: "u1".to_string(),
            username: None,
            first_name: None,
            last_name: None,
            image_url: "https://img.example.com/u.png".to_string(),
            emails: vec![],
            phone_numbers: vec![],
            roles: vec!["User".to_string(), "User".to_string()],
        };

        let aggregate = request.into_aggregate().unwrap();
        assert_eq!(aggregate.id.as_str(), "u1");
        assert_eq!(aggregate.details.roles, vec!["User"]);
    }

    #[test]
    fn test_padded_id_is_rejected() {
        let request: CreateUserRequest = serde_json::from_str(
            r#"{"id": " u1 ", "imageUrl": "https://img.example.com/u.png"}"#,
        )
        .unwrap();

        let err = request.validate_request().unwrap_err();
        assert!(err.to_string().contains("id: Id must not start or end with whitespace"));
        assert!(request.into_aggregate().is_err());
    }
}
