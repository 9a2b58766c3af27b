//! Unit-of-work double whose n-th child insert affects no row.

use crate::child_set::{ChildTable, ReferenceLookup};
use crate::unit_of_work::{ChildRow, UnitOfWork, UnitOfWorkFactory};
use async_trait::async_trait;
use forging_core::{ForgingResult, UserAggregate, UserDetails, UserId};
use parking_lot::Mutex;
use std::sync::Arc;

/// Records every call; parent writes and lookups always succeed.
#[derive(Debug, Clone)]
pub(crate) struct ShortWriteStore {
    calls: Arc<Mutex<Vec<String>>>,
    short_insert: usize,
}

impl ShortWriteStore {
    /// The `n`-th child insert of a unit of work (1-based) reports 0 rows.
    pub(crate) fn short_on_insert(n: usize) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            short_insert: n,
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl UnitOfWorkFactory for ShortWriteStore {
    async fn begin(&self) -> ForgingResult<Box<dyn UnitOfWork>> {
        Ok(Box::new(ShortWriteUnit {
            calls: Arc::clone(&self.calls),
            short_insert: self.short_insert,
            inserts: 0,
        }))
    }
}

struct ShortWriteUnit {
    calls: Arc<Mutex<Vec<String>>>,
    short_insert: usize,
    inserts: usize,
}

impl ShortWriteUnit {
    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl UnitOfWork for ShortWriteUnit {
    async fn insert_user(&mut self, _user: &UserAggregate) -> ForgingResult<u64> {
        self.record("INSERT users".to_string());
        Ok(1)
    }

    async fn update_user(&mut self, _id: &UserId, _details: &UserDetails) -> ForgingResult<u64> {
        self.record("UPDATE users".to_string());
        Ok(1)
    }

    async fn delete_children(&mut self, table: &ChildTable, _parent: &UserId) -> ForgingResult<u64> {
        self.record(format!("DELETE {}", table.table));
        Ok(0)
    }

    async fn insert_child(&mut self, table: &ChildTable, row: &ChildRow<'_>) -> ForgingResult<u64> {
        self.inserts += 1;
        self.record(format!("INSERT {} {}", table.table, row.value));
        Ok(u64::from(self.inserts != self.short_insert))
    }

    async fn resolve_reference(
        &mut self,
        lookup: &ReferenceLookup,
        key: &str,
    ) -> ForgingResult<Option<i64>> {
        self.record(format!("SELECT {} {}", lookup.table, key));
        Ok(Some(1))
    }

    async fn commit(self: Box<Self>) -> ForgingResult<()> {
        self.record("COMMIT".to_string());
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> ForgingResult<()> {
        self.record("ROLLBACK".to_string());
        Ok(())
    }
}
