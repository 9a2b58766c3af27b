//! Whole-set replacement of a parent's child rows.
//!
//! Every child relation of an aggregate is described by a [`ChildTable`].
//! One routine, [`ChildTable::replace`], deletes the parent's existing rows in
//! that table and inserts the new set, stopping at the first row that does
//! not persist. Another aggregate reuses it by declaring its own descriptors.

use crate::unit_of_work::{ChildRow, UnitOfWork};
use forging_core::{ForgingResult, Relation, UserId};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// A reference table a child value must resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceLookup {
    /// Reference table, e.g. `roles`.
    pub table: &'static str,
    /// Column matched against the child value, e.g. `name`.
    pub key_column: &'static str,
    /// Column holding the reference id, e.g. `id`.
    pub id_column: &'static str,
    /// Column in the child table storing the resolved id, e.g. `role_id`.
    pub foreign_key: &'static str,
}

/// Static description of one child relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildTable {
    pub relation: Relation,
    pub table: &'static str,
    pub parent_column: &'static str,
    pub value_column: &'static str,
    pub reference: Option<ReferenceLookup>,
    /// Values form a set: a repeated value is written once.
    pub distinct: bool,
}

/// `user_emails(id, user_id, email)`
pub const USER_EMAILS: ChildTable = ChildTable {
    relation: Relation::Emails,
    table: "user_emails",
    parent_column: "user_id",
    value_column: "email",
    reference: None,
    distinct: false,
};

/// `user_phone_numbers(id, user_id, phone_number)`
pub const USER_PHONE_NUMBERS: ChildTable = ChildTable {
    relation: Relation::PhoneNumbers,
    table: "user_phone_numbers",
    parent_column: "user_id",
    value_column: "phone_number",
    reference: None,
    distinct: false,
};

/// `user_roles(id, user_id, role_id, role)`, `role_id` resolved from `roles.name`.
pub const USER_ROLES: ChildTable = ChildTable {
    relation: Relation::Roles,
    table: "user_roles",
    parent_column: "user_id",
    value_column: "role",
    reference: Some(ReferenceLookup {
        table: "roles",
        key_column: "name",
        id_column: "id",
        foreign_key: "role_id",
    }),
    distinct: true,
};

/// The user aggregate's child relations, in write order.
pub const USER_CHILD_TABLES: [ChildTable; 3] = [USER_EMAILS, USER_PHONE_NUMBERS, USER_ROLES];

/// A child row that failed to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildFailure {
    pub relation: Relation,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for ChildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to insert {} '{}': {}",
            self.relation.item_name(),
            self.value,
            self.reason
        )
    }
}

/// Result of replacing one child set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildSetResult {
    Replaced { deleted: u64, inserted: u64 },
    Failed(ChildFailure),
}

impl ChildTable {
    /// Replaces `parent`'s rows in this table with exactly `values`.
    ///
    /// Must run inside the caller's open unit of work. For a `distinct`
    /// table, repeats of a value already written are skipped. Returns
    /// [`ChildSetResult::Failed`] for the first value whose insert affects no
    /// row, whose reference does not resolve, or that the store rejects with
    /// a constraint violation. No further values are attempted after it.
    ///
    /// # Errors
    ///
    /// Any other store fault.
    pub async fn replace(
        &self,
        unit: &mut dyn UnitOfWork,
        parent: &UserId,
        values: &[String],
    ) -> ForgingResult<ChildSetResult> {
        let deleted = unit.delete_children(self, parent).await?;
        debug!(table = self.table, user_id = %parent, deleted, "Cleared child rows");

        let mut inserted = 0;
        let mut written = HashSet::new();
        for value in values {
            if self.distinct && !written.insert(value.as_str()) {
                debug!(table = self.table, user_id = %parent, value = %value, "Skipped repeated value");
                continue;
            }
            if let Some(failure) = self.insert_one(unit, parent, value).await? {
                warn!(
                    table = self.table,
                    user_id = %parent,
                    value = %failure.value,
                    reason = %failure.reason,
                    "Child row insert failed"
                );
                return Ok(ChildSetResult::Failed(failure));
            }
            inserted += 1;
        }

        debug!(table = self.table, user_id = %parent, inserted, "Inserted child rows");
        Ok(ChildSetResult::Replaced { deleted, inserted })
    }

    async fn insert_one(
        &self,
        unit: &mut dyn UnitOfWork,
        parent: &UserId,
        value: &str,
    ) -> ForgingResult<Option<ChildFailure>> {
        let mut row = ChildRow::new(parent, value);

        if let Some(lookup) = &self.reference {
            match unit.resolve_reference(lookup, value).await? {
                Some(reference_id) => row = row.with_reference(reference_id),
                None => {
                    return Ok(Some(self.failure(
                        value,
                        format!("unknown {} '{}'", self.relation.item_name(), value),
                    )))
                }
            }
        }

        match unit.insert_child(self, &row).await {
            Ok(0) => Ok(Some(self.failure(value, "no row inserted".to_string()))),
            Ok(_) => Ok(None),
            Err(e) if e.is_constraint_violation() => Ok(Some(self.failure(value, e.to_string()))),
            Err(e) => Err(e),
        }
    }

    fn failure(&self, value: &str, reason: String) -> ChildFailure {
        ChildFailure {
            relation: self.relation,
            value: value.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryStore, StoreOp};
    use crate::test_support::ShortWriteStore;
    use crate::unit_of_work::UnitOfWorkFactory;
    use forging_core::{ForgingError, UserAggregate, UserDetails};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    async fn store_with_user(id: &str) -> (InMemoryStore, UserId) {
        let store = InMemoryStore::new();
        let id = UserId::parse(id).unwrap();
        let details = UserDetails::new(
            None,
            None,
            None,
            "https://img.example.com/a.png".to_string(),
            vec![],
            vec![],
            vec![],
        );
        let mut unit = store.begin().await.unwrap();
        unit.insert_user(&UserAggregate::new(id.clone(), details))
            .await
            .unwrap();
        unit.commit().await.unwrap();
        (store, id)
    }

    #[test]
    fn test_descriptors_cover_every_relation_in_order() {
        let relations: Vec<Relation> = USER_CHILD_TABLES.iter().map(|t| t.relation).collect();
        assert_eq!(relations, Relation::all().to_vec());
        assert!(USER_ROLES.reference.is_some());
        assert!(USER_EMAILS.reference.is_none());
        assert!(USER_ROLES.distinct);
        assert!(!USER_EMAILS.distinct && !USER_PHONE_NUMBERS.distinct);
    }

    #[tokio::test]
    async fn test_replace_inserts_every_value() {
        let (store, id) = store_with_user("u1").await;
        let mut unit = store.begin().await.unwrap();

        let result = USER_EMAILS
            .replace(unit.as_mut(), &id, &strings(&["a@x.com", "b@x.com"]))
            .await
            .unwrap();
        unit.commit().await.unwrap();

        assert_eq!(result, ChildSetResult::Replaced { deleted: 0, inserted: 2 });
        assert_eq!(
            store.snapshot().await.children("user_emails", "u1"),
            vec!["a@x.com", "b@x.com"]
        );
    }

    #[tokio::test]
    async fn test_replace_deletes_previous_set() {
        let (store, id) = store_with_user("u1").await;
        for set in [strings(&["a@x.com", "b@x.com"]), strings(&["c@x.com"])] {
            let mut unit = store.begin().await.unwrap();
            USER_EMAILS.replace(unit.as_mut(), &id, &set).await.unwrap();
            unit.commit().await.unwrap();
        }
        assert_eq!(store.snapshot().await.children("user_emails", "u1"), vec!["c@x.com"]);
    }

    #[tokio::test]
    async fn test_empty_set_clears_relation() {
        let (store, id) = store_with_user("u1").await;
        let mut unit = store.begin().await.unwrap();
        USER_PHONE_NUMBERS
            .replace(unit.as_mut(), &id, &strings(&["+15550100"]))
            .await
            .unwrap();
        let result = USER_PHONE_NUMBERS.replace(unit.as_mut(), &id, &[]).await.unwrap();
        unit.commit().await.unwrap();

        assert_eq!(result, ChildSetResult::Replaced { deleted: 1, inserted: 0 });
        assert!(store.snapshot().await.children("user_phone_numbers", "u1").is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_value_fails_fast() {
        let (store, id) = store_with_user("u1").await;
        let mut unit = store.begin().await.unwrap();

        let result = USER_EMAILS
            .replace(
                unit.as_mut(),
                &id,
                &strings(&["a@x.com", "a@x.com", "z@x.com"]),
            )
            .await
            .unwrap();
        drop(unit);

        match result {
            ChildSetResult::Failed(failure) => {
                assert_eq!(failure.relation, Relation::Emails);
                assert_eq!(failure.value, "a@x.com");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        let inserts = store
            .journal()
            .iter()
            .filter(|entry| entry.starts_with("INSERT user_emails"))
            .count();
        assert_eq!(inserts, 2);
    }

    #[tokio::test]
    async fn test_zero_row_insert_stops_the_set() {
        let store = ShortWriteStore::short_on_insert(2);
        let id = UserId::parse("u1").unwrap();
        let mut unit = store.begin().await.unwrap();

        let result = USER_EMAILS
            .replace(
                unit.as_mut(),
                &id,
                &strings(&["a@x.com", "b@x.com", "c@x.com"]),
            )
            .await
            .unwrap();

        assert_eq!(
            result,
            ChildSetResult::Failed(ChildFailure {
                relation: Relation::Emails,
                value: "b@x.com".to_string(),
                reason: "no row inserted".to_string(),
            })
        );
        assert_eq!(
            store.calls(),
            vec![
                "DELETE user_emails",
                "INSERT user_emails a@x.com",
                "INSERT user_emails b@x.com",
            ]
        );
    }

    #[tokio::test]
    async fn test_distinct_table_writes_repeats_once() {
        let (store, id) = store_with_user("u1").await;
        let mut unit = store.begin().await.unwrap();

        let result = USER_ROLES
            .replace(unit.as_mut(), &id, &strings(&["User", "User", "Admin"]))
            .await
            .unwrap();
        unit.commit().await.unwrap();

        assert_eq!(result, ChildSetResult::Replaced { deleted: 0, inserted: 2 });
        assert_eq!(store.snapshot().await.children("user_roles", "u1"), vec!["User", "Admin"]);
    }

    #[tokio::test]
    async fn test_unknown_role_fails_without_insert() {
        let (store, id) = store_with_user("u1").await;
        let mut unit = store.begin().await.unwrap();

        let result = USER_ROLES
            .replace(unit.as_mut(), &id, &strings(&["Wizard", "Admin"]))
            .await
            .unwrap();
        drop(unit);

        assert_eq!(
            result,
            ChildSetResult::Failed(ChildFailure {
                relation: Relation::Roles,
                value: "Wizard".to_string(),
                reason: "unknown role 'Wizard'".to_string(),
            })
        );
        assert!(!store
            .journal()
            .iter()
            .any(|entry| entry.starts_with("INSERT user_roles")));
    }

    #[tokio::test]
    async fn test_roles_store_resolved_reference() {
        let (store, id) = store_with_user("u1").await;
        let mut unit = store.begin().await.unwrap();
        USER_ROLES
            .replace(unit.as_mut(), &id, &strings(&["Admin", "User"]))
            .await
            .unwrap();
        unit.commit().await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.children("user_roles", "u1"), vec!["Admin", "User"]);
        assert_eq!(snapshot.reference_ids("user_roles", "u1"), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_store_fault_propagates() {
        let (store, id) = store_with_user("u1").await;
        store.fail_next(StoreOp::InsertChild("user_emails"));
        let mut unit = store.begin().await.unwrap();

        let result = USER_EMAILS
            .replace(unit.as_mut(), &id, &strings(&["a@x.com"]))
            .await;
        assert!(matches!(result, Err(ForgingError::Database(_))));
    }

    #[test]
    fn test_failure_display() {
        let failure = ChildFailure {
            relation: Relation::PhoneNumbers,
            value: "+1555".to_string(),
            reason: "no row inserted".to_string(),
        };
        assert_eq!(
            failure.to_string(),
            "Failed to insert phone number '+1555': no row inserted"
        );
    }
}
