//! User aggregate service implementations.

use crate::dto::{CreateUserRequest, ReplaceUserRequest};
use crate::outcome::Outcome;
use crate::user_aggregate_service::UserAggregateService;
use async_trait::async_trait;
use forging_core::{field_errors, UserDetails, UserId};
use forging_repository::AggregateWriter;
use shaku::Component;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

/// Generic user aggregate service implementation (non-DI).
pub struct UserAggregateServiceImpl<W: AggregateWriter> {
    writer: Arc<W>,
}

impl<W: AggregateWriter> UserAggregateServiceImpl<W> {
    /// Creates a new user aggregate service.
    pub fn new(writer: Arc<W>) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl<W: AggregateWriter + 'static> UserAggregateService for UserAggregateServiceImpl<W> {
    async fn create_user(&self, request: CreateUserRequest) -> Outcome {
        create_user(self.writer.as_ref(), request).await
    }

    async fn replace_user(&self, id: &str, request: ReplaceUserRequest) -> Outcome {
        replace_user(self.writer.as_ref(), id, request).await
    }
}

impl<W: AggregateWriter> std::fmt::Debug for UserAggregateServiceImpl<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAggregateServiceImpl").finish_non_exhaustive()
    }
}

// ============================================================================
// DI Component
// ============================================================================

/// User aggregate service wired through shaku.
#[derive(Component)]
#[shaku(interface = UserAggregateService)]
pub struct UserAggregateServiceComponent {
    #[shaku(inject)]
    writer: Arc<dyn AggregateWriter>,
}

#[async_trait]
impl UserAggregateService for UserAggregateServiceComponent {
    async fn create_user(&self, request: CreateUserRequest) -> Outcome {
        create_user(self.writer.as_ref(), request).await
    }

    async fn replace_user(&self, id: &str, request: ReplaceUserRequest) -> Outcome {
        replace_user(self.writer.as_ref(), id, request).await
    }
}

impl std::fmt::Debug for UserAggregateServiceComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAggregateServiceComponent").finish_non_exhaustive()
    }
}

async fn create_user<W: AggregateWriter + ?Sized>(writer: &W, request: CreateUserRequest) -> Outcome {
    debug!("Creating user aggregate: {}", request.id);

    if let Err(errors) = request.validate() {
        return Outcome::rejected(field_errors(&errors));
    }

    let aggregate = match request.into_aggregate() {
        Ok(aggregate) => aggregate,
        Err(e) => return Outcome::from(e),
    };

    let outcome = Outcome::report(writer.create(&aggregate).await);
    if outcome.is_success() {
        info!("User aggregate created: {}", aggregate.id);
    }
    outcome
}

async fn replace_user<W: AggregateWriter + ?Sized>(
    writer: &W,
    id: &str,
    request: ReplaceUserRequest,
) -> Outcome {
    debug!("Replacing user aggregate: {}", id);

    let id = match UserId::parse(id) {
        Ok(id) => id,
        Err(e) => return Outcome::from(e),
    };
    if let Err(errors) = request.validate() {
        return Outcome::rejected(field_errors(&errors));
    }

    let details = UserDetails::from(request);
    let outcome = Outcome::report(writer.replace(&id, &details).await);
    if outcome.is_success() {
        info!("User aggregate replaced: {}", id);
    }
    outcome
}
