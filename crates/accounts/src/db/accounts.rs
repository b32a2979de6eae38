//! Account repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use kabaditech_core::{AccountId, AccountRole, ActivationTokenId, Email};

use super::RepositoryError;
use crate::models::Account;

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: i32,
    email: String,
    full_name: String,
    role: AccountRole,
    is_active: bool,
    is_staff: bool,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: AccountId::new(row.id),
            email,
            full_name: row.full_name,
            role: row.role,
            is_active: row.is_active,
            is_staff: row.is_staff,
            is_admin: row.is_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ACCOUNT_COLUMNS: &str =
    "id, email, full_name, role, is_active, is_staff, is_admin, created_at, updated_at";

/// Repository for account database operations.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an account by its email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts.account WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an account by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts.account WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a new inactive account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        full_name: &str,
        password_hash: &str,
        role: AccountRole,
    ) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "INSERT INTO accounts.account (email, full_name, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(full_name)
        .bind(password_hash)
        .bind(role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already registered".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    /// Create an active staff account (CLI bootstrap).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create_staff(
        &self,
        email: &Email,
        full_name: &str,
        password_hash: &str,
    ) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "INSERT INTO accounts.account
                 (email, full_name, password_hash, role, is_active, is_staff)
             VALUES ($1, $2, $3, 'customer', TRUE, TRUE)
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(full_name)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already registered".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    /// Get an account together with its password hash, for credential checks.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct AccountWithHashRow {
            #[sqlx(flatten)]
            account: AccountRow,
            password_hash: String,
        }

        let row = sqlx::query_as::<_, AccountWithHashRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS}, password_hash FROM accounts.account WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => {
                let account: Account = r.account.try_into()?;
                Ok(Some((account, r.password_hash)))
            }
            None => Ok(None),
        }
    }

    /// Activate an account by consuming an activation token.
    ///
    /// Both updates run in one transaction; the `used_at IS NULL` guard makes
    /// the token single-use even under concurrent activation attempts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the token was consumed by a
    /// concurrent request, `RepositoryError::NotFound` if the account row is
    /// gone.
    pub async fn activate(
        &self,
        account_id: AccountId,
        token_id: ActivationTokenId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let consumed = sqlx::query(
            "UPDATE accounts.activation_token
             SET used_at = NOW()
             WHERE id = $1 AND used_at IS NULL",
        )
        .bind(token_id.as_i32())
        .execute(&mut *tx)
        .await?;

        if consumed.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(
                "activation token already used".to_owned(),
            ));
        }

        let activated = sqlx::query(
            "UPDATE accounts.account
             SET is_active = TRUE, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(account_id.as_i32())
        .execute(&mut *tx)
        .await?;

        if activated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    /// Update an account's display name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    pub async fn update_full_name(
        &self,
        id: AccountId,
        full_name: &str,
    ) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "UPDATE accounts.account
             SET full_name = $1, updated_at = NOW()
             WHERE id = $2
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(full_name)
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete an account and everything it owns.
    ///
    /// Dependent rows are removed explicitly inside one transaction rather
    /// than through FK cascade, so a failure anywhere rolls the whole unit
    /// back.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    pub async fn delete(&self, id: AccountId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for table in [
            "accounts.refresh_token",
            "accounts.activation_token",
            "accounts.address",
            "accounts.customer_profile",
            "accounts.dealer_profile",
        ] {
            sqlx::query(&format!("DELETE FROM {table} WHERE account_id = $1"))
                .bind(id.as_i32())
                .execute(&mut *tx)
                .await?;
        }

        let result = sqlx::query("DELETE FROM accounts.account WHERE id = $1")
            .bind(id.as_i32())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}
