//! Identity repository for PostgreSQL
//!
//! Users and admins live in separate tables with the same shape; one
//! `PgIdentityStore` instance serves one table.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::QueryAs;
use uuid::Uuid;

use crate::core::db::models::{Identity, IdentityPatch, NewIdentity};
use crate::core::db::store::{IdentityKey, IdentityStore, StoreError};

const IDENTITY_COLUMNS: &str = "id, name, email, password_hash, role, status, is_deleted, \
     is_email_confirmed, needs_password_change, password_changed_at, created_at, updated_at";

/// Table backing an identity store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityTable {
    Users,
    Admins,
}

impl IdentityTable {
    pub fn name(self) -> &'static str {
        match self {
            IdentityTable::Users => "users",
            IdentityTable::Admins => "admins",
        }
    }
}

/// Build the WHERE predicate for `key`, numbering placeholders from `first`
fn key_predicate(key: &IdentityKey, first: usize) -> String {
    match key {
        IdentityKey::Id(_) => format!("id = ${first}"),
        IdentityKey::Email(_) => format!("email = ${first}"),
        IdentityKey::ActiveEmail(_) => format!("email = ${first} AND status = 'active'"),
        IdentityKey::IdAndEmail(_, _) => format!("id = ${first} AND email = ${}", first + 1),
    }
}

/// Bind the values of `key` in the order `key_predicate` numbers them
fn bind_key<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    key: &'q IdentityKey,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    match key {
        IdentityKey::Id(id) => query.bind(*id),
        IdentityKey::Email(email) | IdentityKey::ActiveEmail(email) => query.bind(email.as_str()),
        IdentityKey::IdAndEmail(id, email) => query.bind(*id).bind(email.as_str()),
    }
}

/// Map unique-constraint violations to `StoreError::Conflict`
fn map_insert_error(err: sqlx::Error, email: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(format!("email {email}"))
        }
        _ => StoreError::DatabaseError(err),
    }
}

/// PostgreSQL identity store
#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
    table: IdentityTable,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool, table: IdentityTable) -> Self {
        Self { pool, table }
    }

    /// Store over the `users` table
    pub fn users(pool: PgPool) -> Self {
        Self::new(pool, IdentityTable::Users)
    }

    /// Store over the `admins` table
    pub fn admins(pool: PgPool) -> Self {
        Self::new(pool, IdentityTable::Admins)
    }

    pub fn table(&self) -> IdentityTable {
        self.table
    }

    fn select_sql(&self, key: &IdentityKey) -> String {
        format!(
            "SELECT {IDENTITY_COLUMNS} FROM {} WHERE {} LIMIT 1",
            self.table.name(),
            key_predicate(key, 1)
        )
    }

    fn update_sql(&self, key: &IdentityKey) -> String {
        format!(
            r#"
            UPDATE {}
            SET
                password_hash = COALESCE($1, password_hash),
                status = COALESCE($2, status),
                is_deleted = COALESCE($3, is_deleted),
                is_email_confirmed = COALESCE($4, is_email_confirmed),
                needs_password_change = COALESCE($5, needs_password_change),
                password_changed_at = COALESCE($6, password_changed_at),
                updated_at = NOW()
            WHERE {}
            RETURNING {IDENTITY_COLUMNS}
            "#,
            self.table.name(),
            key_predicate(key, 7)
        )
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_key(&self, key: &IdentityKey) -> Result<Option<Identity>, StoreError> {
        let sql = self.select_sql(key);

        let identity = bind_key(sqlx::query_as::<_, Identity>(&sql), key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(identity)
    }

    async fn update_by_key(
        &self,
        key: &IdentityKey,
        patch: &IdentityPatch,
    ) -> Result<Option<Identity>, StoreError> {
        let sql = self.update_sql(key);

        let query = sqlx::query_as::<_, Identity>(&sql)
            .bind(patch.password_hash.as_deref())
            .bind(patch.status)
            .bind(patch.is_deleted)
            .bind(patch.is_email_confirmed)
            .bind(patch.needs_password_change)
            .bind(patch.password_changed_at);

        let identity = bind_key(query, key).fetch_optional(&self.pool).await?;

        Ok(identity)
    }

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
            self.table.name()
        );

        let exists: (bool,) = sqlx::query_as(&sql).bind(id).fetch_one(&self.pool).await?;

        Ok(exists.0)
    }

    async fn insert(&self, new: &NewIdentity) -> Result<Identity, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO {} (name, email, password_hash, role, is_email_confirmed, needs_password_change)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {IDENTITY_COLUMNS}
            "#,
            self.table.name()
        );

        sqlx::query_as::<_, Identity>(&sql)
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(new.role)
            .bind(new.is_email_confirmed)
            .bind(new.needs_password_change)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, &new.email))
    }
}
