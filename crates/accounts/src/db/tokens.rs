//! Activation and refresh token repositories.
//!
//! Only sha256 hashes are stored; raw tokens live in the activation email or
//! the login response and nowhere else.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use kabaditech_core::{AccountId, ActivationTokenId, RefreshTokenId};

use super::RepositoryError;
use crate::models::{ActivationToken, RefreshToken};

/// Internal row type for activation token queries.
#[derive(Debug, sqlx::FromRow)]
struct ActivationTokenRow {
    id: i32,
    account_id: i32,
    token_hash: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
}

impl From<ActivationTokenRow> for ActivationToken {
    fn from(row: ActivationTokenRow) -> Self {
        Self {
            id: ActivationTokenId::new(row.id),
            account_id: AccountId::new(row.account_id),
            token_hash: row.token_hash,
            created_at: row.created_at,
            expires_at: row.expires_at,
            used_at: row.used_at,
        }
    }
}

/// Internal row type for refresh token queries.
#[derive(Debug, sqlx::FromRow)]
struct RefreshTokenRow {
    id: i32,
    account_id: i32,
    token_hash: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<RefreshTokenRow> for RefreshToken {
    fn from(row: RefreshTokenRow) -> Self {
        Self {
            id: RefreshTokenId::new(row.id),
            account_id: AccountId::new(row.account_id),
            token_hash: row.token_hash,
            created_at: row.created_at,
            expires_at: row.expires_at,
            revoked_at: row.revoked_at,
        }
    }
}

/// Repository for activation token database operations.
pub struct ActivationTokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ActivationTokenRepository<'a> {
    /// Create a new activation token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new activation token hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        account_id: AccountId,
        token_hash: &str,
        expires_in_days: i32,
    ) -> Result<ActivationToken, RepositoryError> {
        let row = sqlx::query_as::<_, ActivationTokenRow>(
            "INSERT INTO accounts.activation_token (account_id, token_hash, expires_at)
             VALUES ($1, $2, NOW() + make_interval(days => $3))
             RETURNING id, account_id, token_hash, created_at, expires_at, used_at",
        )
        .bind(account_id.as_i32())
        .bind(token_hash)
        .bind(expires_in_days)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Look up a token by owner and hash.
    ///
    /// Validity (unused, unexpired) is the caller's check via the domain
    /// type; consumption happens in `AccountRepository::activate`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        account_id: AccountId,
        token_hash: &str,
    ) -> Result<Option<ActivationToken>, RepositoryError> {
        let row = sqlx::query_as::<_, ActivationTokenRow>(
            "SELECT id, account_id, token_hash, created_at, expires_at, used_at
             FROM accounts.activation_token
             WHERE account_id = $1 AND token_hash = $2",
        )
        .bind(account_id.as_i32())
        .bind(token_hash)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Delete expired, unused tokens (cleanup).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM accounts.activation_token
             WHERE used_at IS NULL AND expires_at < NOW()",
        )
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// Repository for refresh token database operations.
pub struct RefreshTokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RefreshTokenRepository<'a> {
    /// Create a new refresh token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new refresh token hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        account_id: AccountId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken, RepositoryError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            "INSERT INTO accounts.refresh_token (account_id, token_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING id, account_id, token_hash, created_at, expires_at, revoked_at",
        )
        .bind(account_id.as_i32())
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Look up a live (unrevoked, unexpired) token by hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_live(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, RepositoryError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            "SELECT id, account_id, token_hash, created_at, expires_at, revoked_at
             FROM accounts.refresh_token
             WHERE token_hash = $1 AND revoked_at IS NULL AND expires_at > NOW()",
        )
        .bind(token_hash)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Revoke a token, scoped to its owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no live token matches.
    pub async fn revoke(
        &self,
        account_id: AccountId,
        token_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE accounts.refresh_token
             SET revoked_at = NOW()
             WHERE token_hash = $1 AND account_id = $2 AND revoked_at IS NULL",
        )
        .bind(token_hash)
        .bind(account_id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete expired tokens (cleanup).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM accounts.refresh_token WHERE expires_at < NOW()")
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
