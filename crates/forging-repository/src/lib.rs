//! # Forging Repository
//!
//! Atomic writes of the user aggregate: one `users` row plus its
//! `user_emails`, `user_phone_numbers` and `user_roles` rows.
//!
//! ```text
//! AggregateWriter              (create / replace, one unit of work each)
//!   ↓  ChildTable::replace     (delete + re-insert one child set)
//!   ↓  Box<dyn UnitOfWork>     (affected-row primitives, commit, rollback)
//! PgUnitOfWork | InMemoryStore
//! ```

pub mod aggregate_writer;
pub mod child_set;
pub mod memory;
pub mod pool;
pub mod postgres;
pub mod unit_of_work;

#[cfg(test)]
mod test_support;

pub use aggregate_writer::*;
pub use child_set::*;
pub use memory::{InMemoryStore, StoreOp, StoreSnapshot};
pub use pool::*;
pub use postgres::*;
pub use unit_of_work::*;
