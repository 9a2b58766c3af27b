//! Atomic create and replace of a user aggregate.

use crate::child_set::{ChildFailure, ChildSetResult, USER_CHILD_TABLES};
use crate::unit_of_work::{CommitDecision, UnitOfWork, UnitOfWorkFactory, UnitOfWorkScope};
use async_trait::async_trait;
use forging_core::{ForgingError, ForgingResult, Interface, UserAggregate, UserDetails, UserId};
use shaku::Component;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Result of one aggregate write.
///
/// Only `Created` and `Replaced` leave anything behind in the store; the other
/// variants are reached after a full rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    Created(UserAggregate),
    Replaced,
    NotFound { id: UserId },
    PartialFailure(ChildFailure),
}

impl CommitDecision for WriteResult {
    fn should_commit(&self) -> bool {
        matches!(self, Self::Created(_) | Self::Replaced)
    }
}

/// Writes a user aggregate and all its child rows as one unit.
#[async_trait]
pub trait AggregateWriter: Interface + Send + Sync {
    /// Inserts a new aggregate.
    async fn create(&self, aggregate: &UserAggregate) -> ForgingResult<WriteResult>;

    /// Overwrites an existing aggregate's scalars and child sets.
    async fn replace(&self, id: &UserId, details: &UserDetails) -> ForgingResult<WriteResult>;
}

/// [`AggregateWriter`] over any unit-of-work store.
#[derive(Component, Clone)]
#[shaku(interface = AggregateWriter)]
pub struct UserAggregateWriter {
    #[shaku(inject)]
    units: Arc<dyn UnitOfWorkFactory>,
}

impl UserAggregateWriter {
    /// Creates a writer over the given store.
    #[must_use]
    pub fn new(units: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { units }
    }

    async fn insert_aggregate(
        unit: &mut dyn UnitOfWork,
        aggregate: &UserAggregate,
    ) -> ForgingResult<WriteResult> {
        let affected = unit.insert_user(aggregate).await?;
        if affected != 1 {
            return Err(ForgingError::database(format!(
                "expected 1 users row inserted for {}, got {}",
                aggregate.id, affected
            )));
        }

        Ok(match Self::replace_children(unit, &aggregate.id, &aggregate.details).await? {
            Some(failure) => WriteResult::PartialFailure(failure),
            None => WriteResult::Created(aggregate.clone()),
        })
    }

    async fn overwrite_aggregate(
        unit: &mut dyn UnitOfWork,
        id: &UserId,
        details: &UserDetails,
    ) -> ForgingResult<WriteResult> {
        if unit.update_user(id, details).await? == 0 {
            return Ok(WriteResult::NotFound { id: id.clone() });
        }

        Ok(match Self::replace_children(unit, id, details).await? {
            Some(failure) => WriteResult::PartialFailure(failure),
            None => WriteResult::Replaced,
        })
    }

    /// Replaces each child set in write order, stopping at the first failure.
    async fn replace_children(
        unit: &mut dyn UnitOfWork,
        id: &UserId,
        details: &UserDetails,
    ) -> ForgingResult<Option<ChildFailure>> {
        for table in &USER_CHILD_TABLES {
            let values = details.children(table.relation);
            if let ChildSetResult::Failed(failure) = table.replace(unit, id, values).await? {
                return Ok(Some(failure));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl AggregateWriter for UserAggregateWriter {
    #[instrument(skip(self, aggregate), fields(user_id = %aggregate.id))]
    async fn create(&self, aggregate: &UserAggregate) -> ForgingResult<WriteResult> {
        let mut scope = UnitOfWorkScope::begin(self.units.as_ref()).await?;
        let result = Self::insert_aggregate(scope.session(), aggregate).await;
        let result = scope.complete(result).await;

        log_result(&result);
        result
    }

    #[instrument(skip(self, details), fields(user_id = %id))]
    async fn replace(&self, id: &UserId, details: &UserDetails) -> ForgingResult<WriteResult> {
        let mut scope = UnitOfWorkScope::begin(self.units.as_ref()).await?;
        let result = Self::overwrite_aggregate(scope.session(), id, details).await;
        let result = scope.complete(result).await;

        log_result(&result);
        result
    }
}

fn log_result(result: &ForgingResult<WriteResult>) {
    match result {
        Ok(WriteResult::Created(_)) => info!("User aggregate created"),
        Ok(WriteResult::Replaced) => info!("User aggregate replaced"),
        Ok(WriteResult::NotFound { .. }) => warn!("User aggregate not found"),
        Ok(WriteResult::PartialFailure(failure)) => {
            warn!(relation = %failure.relation, "User aggregate write aborted: {}", failure);
        }
        Err(e) => warn!(error = %e, "User aggregate write failed"),
    }
}

impl std::fmt::Debug for UserAggregateWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAggregateWriter").finish_non_exhaustive()
    }
}
