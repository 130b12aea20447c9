//! Credential store backed by Postgres.
//!
//! Lookups only return active accounts, so a disabled account behaves like
//! one that never existed.

use super::token::Role;
use super::utils::is_unique_violation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique constraint hit while creating an account.
    #[error("duplicate account")]
    Duplicate,

    #[error("store unavailable")]
    Unavailable(#[source] sqlx::Error),

    /// A stored row failed to decode, e.g. an unknown role value.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// An active account with its stored credential.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Listing row for the admin surface. Never carries the password hash.
#[derive(Debug, Clone)]
pub struct AccountSummary {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Read-only profile attached to an identity when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub display_name: Option<String>,
    pub program: Option<String>,
    pub cohort: Option<String>,
}

/// Fields required to create an account.
#[derive(Debug)]
pub struct NewAccount {
    pub email: String,
    pub email_normalized: String,
    pub password_hash: String,
    pub role: Role,
}

/// Persistence seam for accounts and profiles.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create an account, failing with [`StoreError::Duplicate`] if the
    /// normalized email is already taken.
    async fn create_account(&self, new_account: &NewAccount) -> Result<Account, StoreError>;

    /// Look up an active account by normalized email.
    async fn find_by_email(&self, email_normalized: &str) -> Result<Option<Account>, StoreError>;

    /// Look up an active account by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    async fn load_profile(&self, account_id: Uuid) -> Result<Option<Profile>, StoreError>;

    /// Replace the stored password hash. Returns false if the account is gone.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError>;

    /// Change an account's role. Returns false if the account is gone.
    async fn set_role(&self, id: Uuid, role: Role) -> Result<bool, StoreError>;

    async fn list_accounts(&self) -> Result<Vec<AccountSummary>, StoreError>;
}

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_role(value: &str) -> Result<Role, StoreError> {
    value.parse::<Role>().map_err(StoreError::Corrupt)
}

fn account_from_row(row: &sqlx::postgres::PgRow) -> Result<Account, StoreError> {
    let role: String = row.get("role");
    Ok(Account {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: parse_role(&role)?,
    })
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn create_account(&self, new_account: &NewAccount) -> Result<Account, StoreError> {
        let query = r"
            INSERT INTO accounts (email, email_normalized, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, role
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(&new_account.email)
            .bind(&new_account.email_normalized)
            .bind(&new_account.password_hash)
            .bind(new_account.role.as_str())
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    StoreError::Duplicate
                } else {
                    StoreError::Unavailable(err)
                }
            })?;

        account_from_row(&row)
    }

    async fn find_by_email(&self, email_normalized: &str) -> Result<Option<Account>, StoreError> {
        let query = r"
            SELECT id, email, password_hash, role
            FROM accounts
            WHERE email_normalized = $1 AND status = 'active'
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email_normalized)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(StoreError::Unavailable)?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let query = r"
            SELECT id, email, password_hash, role
            FROM accounts
            WHERE id = $1 AND status = 'active'
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(StoreError::Unavailable)?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn load_profile(&self, account_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let query = r"
            SELECT display_name, program, cohort
            FROM profiles
            WHERE account_id = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(StoreError::Unavailable)?;

        Ok(row.map(|row| Profile {
            display_name: row.get("display_name"),
            program: row.get("program"),
            cohort: row.get("cohort"),
        }))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        let query = r"
            UPDATE accounts
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'active'
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(StoreError::Unavailable)?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<bool, StoreError> {
        let query = r"
            UPDATE accounts
            SET role = $2, updated_at = NOW()
            WHERE id = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .bind(role.as_str())
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(StoreError::Unavailable)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_accounts(&self) -> Result<Vec<AccountSummary>, StoreError> {
        let query = r"
            SELECT id, email, role, created_at
            FROM accounts
            ORDER BY created_at DESC
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .map_err(StoreError::Unavailable)?;

        rows.into_iter()
            .map(|row| {
                let role: String = row.get("role");
                Ok(AccountSummary {
                    id: row.get("id"),
                    email: row.get("email"),
                    role: parse_role(&role)?,
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }
}
