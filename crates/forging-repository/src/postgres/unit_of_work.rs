use crate::child_set::{ChildTable, ReferenceLookup};
use crate::unit_of_work::{ChildRow, UnitOfWork, UnitOfWorkFactory};
use crate::DatabasePoolInterface;
use async_trait::async_trait;
use forging_core::{ForgingResult, UserAggregate, UserDetails, UserId};
use shaku::Component;
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use tracing::debug;

/// Opens PostgreSQL transactions on the shared pool.
#[derive(Component, Clone)]
#[shaku(interface = UnitOfWorkFactory)]
pub struct PgUnitOfWorkFactory {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgUnitOfWorkFactory {
    /// Creates a factory over the given pool.
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWorkFactory for PgUnitOfWorkFactory {
    async fn begin(&self) -> ForgingResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.inner().begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

/// One PostgreSQL transaction. Rolled back by sqlx when dropped uncommitted.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn insert_user(&mut self, user: &UserAggregate) -> ForgingResult<u64> {
        debug!("Inserting user: {}", user.id);

        let details = &user.details;
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, first_name, last_name, image_url, joined_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id.as_str())
        .bind(&details.username)
        .bind(&details.first_name)
        .bind(&details.last_name)
        .bind(&details.image_url)
        .bind(user.joined_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn update_user(&mut self, id: &UserId, details: &UserDetails) -> ForgingResult<u64> {
        debug!("Updating user: {}", id);

        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, first_name = $3, last_name = $4, image_url = $5
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(&details.username)
        .bind(&details.first_name)
        .bind(&details.last_name)
        .bind(&details.image_url)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_children(&mut self, table: &ChildTable, parent: &UserId) -> ForgingResult<u64> {
        debug!("Deleting {} rows of user: {}", table.table, parent);

        let sql = format!(
            "DELETE FROM {} WHERE {} = $1",
            table.table, table.parent_column
        );
        let result = sqlx::query(&sql)
            .bind(parent.as_str())
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn insert_child(&mut self, table: &ChildTable, row: &ChildRow<'_>) -> ForgingResult<u64> {
        debug!("Inserting {} row for user: {}", table.table, row.parent);

        let result = match (&table.reference, row.reference_id) {
            (Some(lookup), reference_id) => {
                let sql = format!(
                    "INSERT INTO {} (id, {}, {}, {}) VALUES ($1, $2, $3, $4)",
                    table.table, table.parent_column, lookup.foreign_key, table.value_column
                );
                sqlx::query(&sql)
                    .bind(row.id.into_inner())
                    .bind(row.parent.as_str())
                    .bind(reference_id)
                    .bind(row.value)
                    .execute(&mut *self.tx)
                    .await?
            }
            (None, _) => {
                let sql = format!(
                    "INSERT INTO {} (id, {}, {}) VALUES ($1, $2, $3)",
                    table.table, table.parent_column, table.value_column
                );
                sqlx::query(&sql)
                    .bind(row.id.into_inner())
                    .bind(row.parent.as_str())
                    .bind(row.value)
                    .execute(&mut *self.tx)
                    .await?
            }
        };

        Ok(result.rows_affected())
    }

    async fn resolve_reference(
        &mut self,
        lookup: &ReferenceLookup,
        key: &str,
    ) -> ForgingResult<Option<i64>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = $1",
            lookup.id_column, lookup.table, lookup.key_column
        );
        let id = sqlx::query_scalar::<_, i64>(&sql)
            .bind(key)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(id)
    }

    async fn commit(self: Box<Self>) -> ForgingResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> ForgingResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

impl std::fmt::Debug for PgUnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgUnitOfWork").finish_non_exhaustive()
    }
}
