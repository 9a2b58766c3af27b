//! User aggregate service trait definition.

use crate::dto::{CreateUserRequest, ReplaceUserRequest};
use crate::outcome::Outcome;
use async_trait::async_trait;
use forging_core::Interface;

/// Entry point for user aggregate writes.
///
/// Failures are reported through [`Outcome`], never as `Err`.
#[async_trait]
pub trait UserAggregateService: Interface + Send + Sync {
    /// Creates a user with all its emails, phone numbers and roles.
    async fn create_user(&self, request: CreateUserRequest) -> Outcome;

    /// Replaces a user's scalars and every child set.
    async fn replace_user(&self, id: &str, request: ReplaceUserRequest) -> Outcome;
}
