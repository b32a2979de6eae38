//! Address repository for database operations.
//!
//! Owns the default-address coordination: a write that marks an address as
//! default demotes every other default of the same account inside the same
//! transaction, so at most one default exists per account at all times. The
//! partial unique index `address_one_default_per_account` is the backstop;
//! writes that trip it are retried a bounded number of times.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgQueryResult;

use kabaditech_core::{AccountId, AddressId};

use super::RepositoryError;
use crate::models::Address;

/// Retries for the demote-then-write transaction when a concurrent default
/// write trips the backstop index.
const MAX_DEFAULT_WRITE_ATTEMPTS: u32 = 3;

const ADDRESS_COLUMNS: &str = "id, account_id, line1, line2, landmark, city, state, \
                               country, postal_code, is_default, created_at, updated_at";

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i32,
    account_id: i32,
    line1: String,
    line2: Option<String>,
    landmark: Option<String>,
    city: String,
    state: String,
    country: String,
    postal_code: String,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            account_id: AccountId::new(row.account_id),
            line1: row.line1,
            line2: row.line2,
            landmark: row.landmark,
            city: row.city,
            state: row.state,
            country: row.country,
            postal_code: row.postal_code,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Fields for a new address.
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub is_default: bool,
}

/// Partial update of an address; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct AddressChanges {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub landmark: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub is_default: Option<bool>,
}

fn is_default_backstop_violation(e: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        return db_err.is_unique_violation()
            && db_err
                .constraint()
                .is_some_and(|c| c == "address_one_default_per_account");
    }
    false
}

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all addresses owned by an account, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM accounts.address
             WHERE account_id = $1
             ORDER BY id"
        ))
        .bind(account_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get one address, scoped to its owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        account_id: AccountId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM accounts.address
             WHERE id = $1 AND account_id = $2"
        ))
        .bind(id.as_i32())
        .bind(account_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create an address for an account.
    ///
    /// When `is_default` is set, any previously-default address of the same
    /// account is demoted in the same transaction before the insert.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn create(
        &self,
        account_id: AccountId,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let mut last_err = None;

        for _attempt in 1..=MAX_DEFAULT_WRITE_ATTEMPTS {
            match self.try_create(account_id, address).await {
                Ok(created) => return Ok(created),
                Err(e) if is_default_backstop_violation(&e) => {
                    tracing::warn!(
                        account_id = %account_id,
                        "concurrent default-address write, retrying"
                    );
                    last_err = Some(e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_err.map_or_else(
            || RepositoryError::Conflict("default address write kept conflicting".to_owned()),
            RepositoryError::Database,
        ))
    }

    async fn try_create(
        &self,
        account_id: AccountId,
        address: &NewAddress,
    ) -> Result<Address, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        if address.is_default {
            demote_other_defaults(&mut tx, account_id, None).await?;
        }

        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "INSERT INTO accounts.address
                 (account_id, line1, line2, landmark, city, state, country,
                  postal_code, is_default)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(account_id.as_i32())
        .bind(&address.line1)
        .bind(address.line2.as_deref())
        .bind(address.landmark.as_deref())
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.postal_code)
        .bind(address.is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Partially update an address, scoped to its owner.
    ///
    /// Promoting an address to default demotes every other default of the
    /// account in the same transaction. Demoting (or leaving `is_default`
    /// untouched) never promotes a replacement; zero defaults is a valid
    /// state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not belong to the
    /// account.
    pub async fn update(
        &self,
        account_id: AccountId,
        id: AddressId,
        changes: &AddressChanges,
    ) -> Result<Address, RepositoryError> {
        let mut last_err = None;

        for _attempt in 1..=MAX_DEFAULT_WRITE_ATTEMPTS {
            match self.try_update(account_id, id, changes).await {
                Ok(Some(updated)) => return Ok(updated),
                Ok(None) => return Err(RepositoryError::NotFound),
                Err(e) if is_default_backstop_violation(&e) => {
                    tracing::warn!(
                        account_id = %account_id,
                        address_id = %id,
                        "concurrent default-address write, retrying"
                    );
                    last_err = Some(e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_err.map_or_else(
            || RepositoryError::Conflict("default address write kept conflicting".to_owned()),
            RepositoryError::Database,
        ))
    }

    async fn try_update(
        &self,
        account_id: AccountId,
        id: AddressId,
        changes: &AddressChanges,
    ) -> Result<Option<Address>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        if changes.is_default == Some(true) {
            demote_other_defaults(&mut tx, account_id, Some(id)).await?;
        }

        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "UPDATE accounts.address SET
                 line1 = COALESCE($3, line1),
                 line2 = COALESCE($4, line2),
                 landmark = COALESCE($5, landmark),
                 city = COALESCE($6, city),
                 state = COALESCE($7, state),
                 country = COALESCE($8, country),
                 postal_code = COALESCE($9, postal_code),
                 is_default = COALESCE($10, is_default),
                 updated_at = NOW()
             WHERE id = $1 AND account_id = $2
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(account_id.as_i32())
        .bind(changes.line1.as_deref())
        .bind(changes.line2.as_deref())
        .bind(changes.landmark.as_deref())
        .bind(changes.city.as_deref())
        .bind(changes.state.as_deref())
        .bind(changes.country.as_deref())
        .bind(changes.postal_code.as_deref())
        .bind(changes.is_default)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.map(Into::into))
    }

    /// Delete an address, scoped to its owner.
    ///
    /// Deleting the current default leaves the account with zero defaults;
    /// no replacement is promoted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not belong to the
    /// account.
    pub async fn delete(&self, account_id: AccountId, id: AddressId) -> Result<(), RepositoryError> {
        let result: PgQueryResult =
            sqlx::query("DELETE FROM accounts.address WHERE id = $1 AND account_id = $2")
                .bind(id.as_i32())
                .bind(account_id.as_i32())
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

/// Demote every default address of `account_id`, optionally excluding the
/// row being written.
async fn demote_other_defaults(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account_id: AccountId,
    exclude: Option<AddressId>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE accounts.address
         SET is_default = FALSE, updated_at = NOW()
         WHERE account_id = $1 AND is_default AND id <> COALESCE($2, -1)",
    )
    .bind(account_id.as_i32())
    .bind(exclude.map(|id| id.as_i32()))
    .execute(&mut **tx)
    .await?;

    Ok(())
}
