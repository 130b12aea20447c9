//! Refresh token ledger backed by Postgres.
//!
//! The ledger stores only SHA-256 hashes of refresh tokens. It is the
//! authority on liveness: a token whose signature still verifies is dead
//! once its ledger row is revoked, rotated away, or past expiry.

use super::store::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

/// Ledger row for one issued refresh token.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub account_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl RefreshTokenRecord {
    /// A record expiring exactly now is already expired.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && now < self.expires_at
    }
}

/// Persistence seam for the refresh token ledger.
#[async_trait]
pub trait RefreshTokenLedger: Send + Sync {
    /// Record a freshly issued token hash.
    async fn record(
        &self,
        account_id: Uuid,
        token_hash: &[u8],
        ttl_seconds: i64,
    ) -> Result<(), StoreError>;

    /// Look up a live (unrevoked, unexpired) record by token hash.
    async fn lookup_active(
        &self,
        token_hash: &[u8],
    ) -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Atomically retire the old token and record its successor.
    ///
    /// Returns false when the old token was not live, which covers replay of
    /// an already-rotated token and the loser of a concurrent rotation race.
    async fn rotate(
        &self,
        old_hash: &[u8],
        account_id: Uuid,
        new_hash: &[u8],
        ttl_seconds: i64,
    ) -> Result<bool, StoreError>;

    /// Revoke one token. Idempotent; revoking an unknown hash is a no-op.
    async fn revoke(&self, token_hash: &[u8]) -> Result<(), StoreError>;

    /// Revoke every live token for an account. Returns the number revoked.
    async fn revoke_all(&self, account_id: Uuid) -> Result<u64, StoreError>;
}

pub struct PostgresRefreshTokenLedger {
    pool: PgPool,
}

impl PostgresRefreshTokenLedger {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenLedger for PostgresRefreshTokenLedger {
    async fn record(
        &self,
        account_id: Uuid,
        token_hash: &[u8],
        ttl_seconds: i64,
    ) -> Result<(), StoreError> {
        let query = r"
            INSERT INTO refresh_tokens (account_id, token_hash, expires_at)
            VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(account_id)
            .bind(token_hash)
            .bind(ttl_seconds)
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(StoreError::Unavailable)?;

        Ok(())
    }

    async fn lookup_active(
        &self,
        token_hash: &[u8],
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let query = r"
            SELECT account_id, issued_at, expires_at, revoked
            FROM refresh_tokens
            WHERE token_hash = $1 AND revoked = FALSE AND expires_at > NOW()
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(StoreError::Unavailable)?;

        Ok(row.map(|row| RefreshTokenRecord {
            account_id: row.get("account_id"),
            issued_at: row.get("issued_at"),
            expires_at: row.get("expires_at"),
            revoked: row.get("revoked"),
        }))
    }

    async fn rotate(
        &self,
        old_hash: &[u8],
        account_id: Uuid,
        new_hash: &[u8],
        ttl_seconds: i64,
    ) -> Result<bool, StoreError> {
        // The conditional UPDATE claims the old token; only the claimant
        // inserts a successor. Concurrent rotations of the same token race on
        // this row and exactly one wins.
        let mut tx = self.pool.begin().await.map_err(StoreError::Unavailable)?;

        let query = r"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE token_hash = $1
              AND account_id = $2
              AND revoked = FALSE
              AND expires_at > NOW()
            RETURNING id
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let claimed = sqlx::query(query)
            .bind(old_hash)
            .bind(account_id)
            .fetch_optional(&mut *tx)
            .instrument(span)
            .await
            .map_err(StoreError::Unavailable)?;

        if claimed.is_none() {
            let _ = tx.rollback().await;
            return Ok(false);
        }

        let query = r"
            INSERT INTO refresh_tokens (account_id, token_hash, expires_at)
            VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(account_id)
            .bind(new_hash)
            .bind(ttl_seconds)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .map_err(StoreError::Unavailable)?;

        tx.commit().await.map_err(StoreError::Unavailable)?;

        Ok(true)
    }

    async fn revoke(&self, token_hash: &[u8]) -> Result<(), StoreError> {
        let query = r"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE token_hash = $1 AND revoked = FALSE
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(token_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(StoreError::Unavailable)?;

        Ok(())
    }

    async fn revoke_all(&self, account_id: Uuid) -> Result<u64, StoreError> {
        let query = r"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE account_id = $1 AND revoked = FALSE
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(account_id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(StoreError::Unavailable)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn record_active_before_expiry() {
        let now = Utc::now();
        let record = RefreshTokenRecord {
            account_id: Uuid::new_v4(),
            issued_at: now,
            expires_at: now + Duration::seconds(60),
            revoked: false,
        };
        assert!(record.is_active(now));
    }

    #[test]
    fn record_expired_at_boundary() {
        let now = Utc::now();
        let record = RefreshTokenRecord {
            account_id: Uuid::new_v4(),
            issued_at: now - Duration::seconds(60),
            expires_at: now,
            revoked: false,
        };
        assert!(!record.is_active(now));
    }

    #[test]
    fn revoked_record_inactive() {
        let now = Utc::now();
        let record = RefreshTokenRecord {
            account_id: Uuid::new_v4(),
            issued_at: now,
            expires_at: now + Duration::seconds(60),
            revoked: true,
        };
        assert!(!record.is_active(now));
    }
}
