//! Unit-of-work seam between the aggregate writer and the store.
//!
//! A unit of work is one transaction on one connection. It exposes only the
//! primitives the aggregate writer needs, each reporting an affected-row
//! count, plus `commit` and `rollback`. Implementations roll back when dropped
//! without a commit, so cancellation and early returns never leave staged
//! rows behind.

use crate::child_set::{ChildTable, ReferenceLookup};
use async_trait::async_trait;
use forging_core::{ChildRowId, ForgingResult, Interface, UserAggregate, UserDetails, UserId};
use tracing::{debug, info, warn};

/// One child row to insert.
#[derive(Debug, Clone, Copy)]
pub struct ChildRow<'a> {
    /// Freshly generated row identifier.
    pub id: ChildRowId,
    /// Owning parent.
    pub parent: &'a UserId,
    /// The relation's value column, e.g. the email address or role name.
    pub value: &'a str,
    /// Resolved reference id for relations that point at a reference table.
    pub reference_id: Option<i64>,
}

impl<'a> ChildRow<'a> {
    /// Creates a row with a new identifier and no reference.
    #[must_use]
    pub fn new(parent: &'a UserId, value: &'a str) -> Self {
        Self {
            id: ChildRowId::new(),
            parent,
            value,
            reference_id: None,
        }
    }

    /// Attaches a resolved reference id.
    #[must_use]
    pub fn with_reference(mut self, reference_id: i64) -> Self {
        self.reference_id = Some(reference_id);
        self
    }
}

/// An open, atomic sequence of store operations.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Inserts the parent row. Returns the affected-row count.
    async fn insert_user(&mut self, user: &UserAggregate) -> ForgingResult<u64>;

    /// Overwrites the parent row's scalars; never touches `joined_at`.
    /// Returns the affected-row count, 0 when the id does not exist.
    async fn update_user(&mut self, id: &UserId, details: &UserDetails) -> ForgingResult<u64>;

    /// Deletes every row of `table` owned by `parent`.
    async fn delete_children(&mut self, table: &ChildTable, parent: &UserId) -> ForgingResult<u64>;

    /// Inserts one child row into `table`.
    async fn insert_child(&mut self, table: &ChildTable, row: &ChildRow<'_>) -> ForgingResult<u64>;

    /// Looks up the id of `key` in a reference table.
    async fn resolve_reference(
        &mut self,
        lookup: &ReferenceLookup,
        key: &str,
    ) -> ForgingResult<Option<i64>>;

    /// Makes every staged write durable.
    async fn commit(self: Box<Self>) -> ForgingResult<()>;

    /// Discards every staged write.
    async fn rollback(self: Box<Self>) -> ForgingResult<()>;
}

/// Opens units of work.
#[async_trait]
pub trait UnitOfWorkFactory: Interface + Send + Sync {
    /// Acquires a connection and opens a transaction on it.
    async fn begin(&self) -> ForgingResult<Box<dyn UnitOfWork>>;
}

/// Decides whether a successful result should be committed.
pub trait CommitDecision {
    fn should_commit(&self) -> bool;
}

/// Scoped unit of work: rolls back unless completed with a committable result.
pub struct UnitOfWorkScope {
    unit: Box<dyn UnitOfWork>,
}

impl UnitOfWorkScope {
    /// Opens a new unit of work.
    ///
    /// # Errors
    ///
    /// Returns the store's error if no connection or transaction can be had.
    pub async fn begin(factory: &dyn UnitOfWorkFactory) -> ForgingResult<Self> {
        let unit = factory.begin().await?;
        debug!("Unit of work opened");
        Ok(Self { unit })
    }

    /// Returns the open unit of work.
    pub fn session(&mut self) -> &mut dyn UnitOfWork {
        self.unit.as_mut()
    }

    /// Ends the scope.
    ///
    /// Commits when `result` is `Ok` and asks for a commit, otherwise rolls
    /// back. The result is handed back unchanged unless the commit itself
    /// fails. A failed rollback is logged; the store discards the
    /// transaction when the connection is released either way.
    ///
    /// # Errors
    ///
    /// Returns `result`'s error, or the commit error.
    pub async fn complete<T: CommitDecision>(self, result: ForgingResult<T>) -> ForgingResult<T> {
        match result {
            Ok(value) if value.should_commit() => {
                self.unit.commit().await?;
                info!("Unit of work committed");
                Ok(value)
            }
            Ok(value) => {
                self.rollback("business outcome").await;
                Ok(value)
            }
            Err(err) => {
                self.rollback(err.error_code()).await;
                Err(err)
            }
        }
    }

    async fn rollback(self, cause: &str) {
        match self.unit.rollback().await {
            Ok(()) => warn!(cause, "Unit of work rolled back"),
            Err(e) => warn!(cause, error = %e, "Unit of work rollback failed"),
        }
    }
}

impl std::fmt::Debug for UnitOfWorkScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWorkScope").finish_non_exhaustive()
    }
}
