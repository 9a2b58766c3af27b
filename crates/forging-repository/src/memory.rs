//! In-memory transactional store.
//!
//! Implements the unit-of-work seam without a database, for tests and local
//! development. One unit of work holds the store at a time (serializable).
//! Writes are staged on a private copy of the tables and published on commit;
//! a rollback or a drop discards them and releases the store.
//!
//! The store enforces the same integrity rules as the schema: primary keys,
//! `(parent, value)` uniqueness, the parent foreign key and the reference
//! foreign key. Every statement is appended to a journal, a single upcoming
//! statement can be made to fail, and each statement can be slowed down to
//! exercise cancellation.

use crate::child_set::{ChildTable, ReferenceLookup};
use crate::unit_of_work::{ChildRow, UnitOfWork, UnitOfWorkFactory};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forging_core::{
    ChildRowId, ForgingError, ForgingResult, UserAggregate, UserDetails, UserId,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Role names seeded into the `roles` reference table, ids starting at 1.
pub const SEEDED_ROLES: [&str; 3] = ["Admin", "Moderator", "User"];

/// A statement kind, used to target fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    InsertUser,
    UpdateUser,
    DeleteChildren(&'static str),
    InsertChild(&'static str),
    ResolveReference(&'static str),
    Commit,
}

#[derive(Debug, Clone)]
struct UserRecord {
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    image_url: String,
    joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct ChildRecord {
    id: ChildRowId,
    parent: String,
    value: String,
    reference_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<String, UserRecord>,
    children: HashMap<&'static str, Vec<ChildRecord>>,
    references: HashMap<&'static str, Vec<(i64, String)>>,
}

impl Tables {
    fn seeded() -> Self {
        let roles: Vec<(i64, String)> = (1..)
            .zip(SEEDED_ROLES)
            .map(|(id, name)| (id, name.to_string()))
            .collect();
        Self {
            references: HashMap::from([("roles", roles)]),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct Diagnostics {
    journal: Mutex<Vec<String>>,
    faults: Mutex<Vec<StoreOp>>,
    delay: Mutex<Option<Duration>>,
}

impl Diagnostics {
    /// Records a statement, applies the configured delay and fires a pending fault.
    async fn execute(&self, op: StoreOp, entry: String) -> ForgingResult<()> {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        debug!(statement = %entry, "In-memory statement");
        self.journal.lock().push(entry);

        let mut faults = self.faults.lock();
        if let Some(index) = faults.iter().position(|fault| *fault == op) {
            faults.remove(index);
            return Err(ForgingError::database(format!("injected fault on {:?}", op)));
        }
        Ok(())
    }

    fn record(&self, entry: &str) {
        self.journal.lock().push(entry.to_string());
    }
}

/// In-memory implementation of [`UnitOfWorkFactory`].
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    tables: Arc<AsyncMutex<Tables>>,
    diagnostics: Arc<Diagnostics>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates an empty store with the seeded `roles` table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Arc::new(AsyncMutex::new(Tables::seeded())),
            diagnostics: Arc::new(Diagnostics::default()),
        }
    }

    /// Makes the next statement of kind `op` fail with a database error.
    pub fn fail_next(&self, op: StoreOp) {
        self.diagnostics.faults.lock().push(op);
    }

    /// Delays every subsequent statement by `delay`.
    pub fn set_statement_delay(&self, delay: Option<Duration>) {
        *self.diagnostics.delay.lock() = delay;
    }

    /// Returns every statement executed so far, in order.
    #[must_use]
    pub fn journal(&self) -> Vec<String> {
        self.diagnostics.journal.lock().clone()
    }

    /// Returns the committed state, waiting for any open unit of work.
    pub async fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            tables: self.tables.lock().await.clone(),
        }
    }

    /// Returns the committed state, or `None` while a unit of work is open.
    #[must_use]
    pub fn try_snapshot(&self) -> Option<StoreSnapshot> {
        self.tables.try_lock().ok().map(|tables| StoreSnapshot {
            tables: tables.clone(),
        })
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryStore {
    async fn begin(&self) -> ForgingResult<Box<dyn UnitOfWork>> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let staged = guard.clone();
        self.diagnostics.record("BEGIN");
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            staged,
            diagnostics: Arc::clone(&self.diagnostics),
            finished: false,
        }))
    }
}

/// A unit of work over [`InMemoryStore`].
struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
    diagnostics: Arc<Diagnostics>,
    finished: bool,
}

impl MemoryUnitOfWork {
    fn reference_exists(&self, lookup: &ReferenceLookup, id: i64) -> bool {
        self.staged
            .references
            .get(lookup.table)
            .is_some_and(|rows| rows.iter().any(|(row_id, _)| *row_id == id))
    }

    fn check_child(&self, table: &ChildTable, row: &ChildRow<'_>) -> ForgingResult<()> {
        if !self.staged.users.contains_key(row.parent.as_str()) {
            return Err(ForgingError::Constraint(format!(
                "insert on table \"{}\" violates foreign key on \"{}\": user {} does not exist",
                table.table, table.parent_column, row.parent
            )));
        }

        let rows = self.staged.children.get(table.table);
        let existing = rows.map(Vec::as_slice).unwrap_or_default();
        if existing.iter().any(|child| child.id == row.id) {
            return Err(ForgingError::conflict(format!(
                "duplicate key value violates unique constraint \"{}_pkey\"",
                table.table
            )));
        }

        match (&table.reference, row.reference_id) {
            (Some(lookup), Some(reference_id)) => {
                if !self.reference_exists(lookup, reference_id) {
                    return Err(ForgingError::Constraint(format!(
                        "insert on table \"{}\" violates foreign key on \"{}\"",
                        table.table, lookup.foreign_key
                    )));
                }
                let duplicate = existing.iter().any(|child| {
                    child.parent == row.parent.as_str() && child.reference_id == Some(reference_id)
                });
                if duplicate {
                    return Err(ForgingError::conflict(format!(
                        "duplicate key value violates unique constraint \"{}_{}_{}_key\"",
                        table.table, table.parent_column, lookup.foreign_key
                    )));
                }
            }
            (Some(lookup), None) => {
                return Err(ForgingError::Constraint(format!(
                    "null value in column \"{}\" of relation \"{}\"",
                    lookup.foreign_key, table.table
                )));
            }
            (None, _) => {
                let duplicate = existing
                    .iter()
                    .any(|child| child.parent == row.parent.as_str() && child.value == row.value);
                if duplicate {
                    return Err(ForgingError::conflict(format!(
                        "duplicate key value violates unique constraint \"{}_{}_{}_key\"",
                        table.table, table.parent_column, table.value_column
                    )));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn insert_user(&mut self, user: &UserAggregate) -> ForgingResult<u64> {
        self.diagnostics
            .execute(StoreOp::InsertUser, format!("INSERT users {}", user.id))
            .await?;

        if self.staged.users.contains_key(user.id.as_str()) {
            return Err(ForgingError::conflict(
                "duplicate key value violates unique constraint \"users_pkey\"",
            ));
        }
        let details = &user.details;
        self.staged.users.insert(
            user.id.as_str().to_string(),
            UserRecord {
                username: details.username.clone(),
                first_name: details.first_name.clone(),
                last_name: details.last_name.clone(),
                image_url: details.image_url.clone(),
                joined_at: user.joined_at,
            },
        );
        Ok(1)
    }

    async fn update_user(&mut self, id: &UserId, details: &UserDetails) -> ForgingResult<u64> {
        self.diagnostics
            .execute(StoreOp::UpdateUser, format!("UPDATE users {}", id))
            .await?;

        let Some(record) = self.staged.users.get_mut(id.as_str()) else {
            return Ok(0);
        };
        record.username.clone_from(&details.username);
        record.first_name.clone_from(&details.first_name);
        record.last_name.clone_from(&details.last_name);
        record.image_url.clone_from(&details.image_url);
        Ok(1)
    }

    async fn delete_children(&mut self, table: &ChildTable, parent: &UserId) -> ForgingResult<u64> {
        self.diagnostics
            .execute(
                StoreOp::DeleteChildren(table.table),
                format!("DELETE {} {}", table.table, parent),
            )
            .await?;

        let Some(rows) = self.staged.children.get_mut(table.table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| row.parent != parent.as_str());
        Ok((before - rows.len()) as u64)
    }

    async fn insert_child(&mut self, table: &ChildTable, row: &ChildRow<'_>) -> ForgingResult<u64> {
        self.diagnostics
            .execute(
                StoreOp::InsertChild(table.table),
                format!("INSERT {} {}", table.table, row.value),
            )
            .await?;

        self.check_child(table, row)?;
        self.staged
            .children
            .entry(table.table)
            .or_default()
            .push(ChildRecord {
                id: row.id,
                parent: row.parent.as_str().to_string(),
                value: row.value.to_string(),
                reference_id: row.reference_id,
            });
        Ok(1)
    }

    async fn resolve_reference(
        &mut self,
        lookup: &ReferenceLookup,
        key: &str,
    ) -> ForgingResult<Option<i64>> {
        self.diagnostics
            .execute(
                StoreOp::ResolveReference(lookup.table),
                format!("SELECT {} {}", lookup.table, key),
            )
            .await?;

        Ok(self.staged.references.get(lookup.table).and_then(|rows| {
            rows.iter()
                .find(|(_, name)| name == key)
                .map(|(id, _)| *id)
        }))
    }

    async fn commit(mut self: Box<Self>) -> ForgingResult<()> {
        self.diagnostics
            .execute(StoreOp::Commit, "COMMIT".to_string())
            .await?;
        self.finished = true;
        *self.guard = std::mem::take(&mut self.staged);
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> ForgingResult<()> {
        self.finished = true;
        self.diagnostics.record("ROLLBACK");
        Ok(())
    }
}

impl Drop for MemoryUnitOfWork {
    fn drop(&mut self) {
        if !self.finished {
            self.diagnostics.record("ROLLBACK");
        }
    }
}

/// A copy of the store's committed tables.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    tables: Tables,
}

impl StoreSnapshot {
    /// Number of parent rows.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.tables.users.len()
    }

    /// Number of rows in a child table, across all parents.
    #[must_use]
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.children.get(table).map_or(0, Vec::len)
    }

    /// Values of `parent`'s rows in a child table, in insertion order.
    #[must_use]
    pub fn children(&self, table: &str, parent: &str) -> Vec<&str> {
        self.rows(table, parent)
            .into_iter()
            .map(|row| row.value.as_str())
            .collect()
    }

    /// Reference ids of `parent`'s rows in a child table, in insertion order.
    #[must_use]
    pub fn reference_ids(&self, table: &str, parent: &str) -> Vec<i64> {
        self.rows(table, parent)
            .into_iter()
            .filter_map(|row| row.reference_id)
            .collect()
    }

    /// Reassembles a stored aggregate.
    #[must_use]
    pub fn aggregate(&self, id: &str) -> Option<UserAggregate> {
        let record = self.tables.users.get(id)?;
        let owned = |table: &str| -> Vec<String> {
            self.children(table, id)
                .into_iter()
                .map(ToString::to_string)
                .collect()
        };
        let details = UserDetails::new(
            record.username.clone(),
            record.first_name.clone(),
            record.last_name.clone(),
            record.image_url.clone(),
            owned("user_emails"),
            owned("user_phone_numbers"),
            owned("user_roles"),
        );
        let id = UserId::parse(id).ok()?;
        Some(UserAggregate::joined_at(id, details, record.joined_at))
    }

    fn rows(&self, table: &str, parent: &str) -> Vec<&ChildRecord> {
        self.tables
            .children
            .get(table)
            .into_iter()
            .flatten()
            .filter(|row| row.parent == parent)
            .collect()
    }
}
