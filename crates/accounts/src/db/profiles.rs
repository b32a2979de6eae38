//! Profile repository for database operations.
//!
//! Covers both profile variants (customer/dealer) and the KT identifier
//! allocation that happens inside the profile-insert transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use kabaditech_core::{AccountId, AccountRole, CustomerKind, DealerKind, KtId, ProfileKind};

use super::RepositoryError;
use crate::models::Profile;

/// Attempts before giving up on a unique KT id.
///
/// A collision can only happen when a concurrent allocation raced the same
/// counter value through a retried transaction; one retry is normally enough.
const MAX_ALLOCATION_ATTEMPTS: u32 = 3;

const PROFILE_COLUMNS: &str =
    "id, account_id, kt_id, kind, picture, qr_code, created_at, updated_at";

/// Internal row type for customer profile queries.
#[derive(Debug, sqlx::FromRow)]
struct CustomerProfileRow {
    id: i32,
    account_id: i32,
    kt_id: String,
    kind: CustomerKind,
    picture: String,
    qr_code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Internal row type for dealer profile queries.
#[derive(Debug, sqlx::FromRow)]
struct DealerProfileRow {
    id: i32,
    account_id: i32,
    kt_id: String,
    kind: DealerKind,
    picture: String,
    qr_code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_kt_id(raw: &str) -> Result<KtId, RepositoryError> {
    KtId::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid KT id in database: {e}")))
}

impl TryFrom<CustomerProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(row: CustomerProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            account_id: AccountId::new(row.account_id),
            kt_id: parse_kt_id(&row.kt_id)?,
            kind: ProfileKind::Customer(row.kind),
            picture: row.picture,
            qr_code: row.qr_code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<DealerProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(row: DealerProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            account_id: AccountId::new(row.account_id),
            kt_id: parse_kt_id(&row.kt_id)?,
            kind: ProfileKind::Dealer(row.kind),
            picture: row.picture,
            qr_code: row.qr_code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Outcome classification for the profile insert inside [`ProfileRepository::create`].
enum InsertError {
    /// The generated KT id collided with an existing row; retry with a fresh serial.
    KtIdCollision,
    /// The account already owns a profile (one-to-one violated).
    ProfileExists,
    /// Anything else.
    Other(RepositoryError),
}

impl From<sqlx::Error> for InsertError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            if db_err
                .constraint()
                .is_some_and(|c| c.ends_with("account_id_key"))
            {
                return Self::ProfileExists;
            }
            return Self::KtIdCollision;
        }
        Self::Other(RepositoryError::Database(e))
    }
}

impl From<RepositoryError> for InsertError {
    fn from(e: RepositoryError) -> Self {
        Self::Other(e)
    }
}

/// The table a role's profile variant lives in.
const fn profile_table(role: AccountRole) -> &'static str {
    match role {
        AccountRole::Customer => "accounts.customer_profile",
        AccountRole::Dealer => "accounts.dealer_profile",
    }
}

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create the profile for a freshly registered account.
    ///
    /// The KT identifier comes from an atomic counter upsert inside the same
    /// transaction as the insert, so concurrent registrations of the same
    /// subtype never observe the same serial. The unique constraint on
    /// `kt_id` is the backstop; on a collision the whole transaction is
    /// retried with a fresh serial, up to [`MAX_ALLOCATION_ATTEMPTS`] times.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the account already owns a
    /// profile, or if no unique KT id could be allocated.
    pub async fn create(
        &self,
        account_id: AccountId,
        kind: ProfileKind,
    ) -> Result<Profile, RepositoryError> {
        let prefix = kind.id_prefix();

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let mut tx = self.pool.begin().await?;

            let serial: i64 = sqlx::query_scalar(
                "INSERT INTO accounts.kt_id_counter (prefix, last_serial)
                 VALUES ($1, 1)
                 ON CONFLICT (prefix) DO UPDATE
                     SET last_serial = kt_id_counter.last_serial + 1
                 RETURNING last_serial",
            )
            .bind(prefix.as_str())
            .fetch_one(&mut *tx)
            .await?;

            let kt_id = KtId::allocate(prefix, serial);

            let inserted: Result<Profile, InsertError> = match kind {
                ProfileKind::Customer(customer_kind) => {
                    match sqlx::query_as::<_, CustomerProfileRow>(&format!(
                        "INSERT INTO accounts.customer_profile (account_id, kt_id, kind)
                         VALUES ($1, $2, $3)
                         RETURNING {PROFILE_COLUMNS}"
                    ))
                    .bind(account_id.as_i32())
                    .bind(kt_id.as_str())
                    .bind(customer_kind)
                    .fetch_one(&mut *tx)
                    .await
                    {
                        Ok(row) => row.try_into().map_err(InsertError::from),
                        Err(e) => Err(e.into()),
                    }
                }
                ProfileKind::Dealer(dealer_kind) => {
                    match sqlx::query_as::<_, DealerProfileRow>(&format!(
                        "INSERT INTO accounts.dealer_profile (account_id, kt_id, kind)
                         VALUES ($1, $2, $3)
                         RETURNING {PROFILE_COLUMNS}"
                    ))
                    .bind(account_id.as_i32())
                    .bind(kt_id.as_str())
                    .bind(dealer_kind)
                    .fetch_one(&mut *tx)
                    .await
                    {
                        Ok(row) => row.try_into().map_err(InsertError::from),
                        Err(e) => Err(e.into()),
                    }
                }
            };

            match inserted {
                Ok(profile) => {
                    tx.commit().await?;
                    return Ok(profile);
                }
                Err(InsertError::KtIdCollision) => {
                    tracing::warn!(
                        prefix = %prefix,
                        attempt,
                        "KT id collision, retrying allocation"
                    );
                }
                Err(InsertError::ProfileExists) => {
                    return Err(RepositoryError::Conflict(
                        "profile already exists for this account".to_owned(),
                    ));
                }
                Err(InsertError::Other(e)) => return Err(e),
            }
        }

        Err(RepositoryError::Conflict(
            "could not allocate a unique KT id".to_owned(),
        ))
    }

    /// Get the profile owned by an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_account(
        &self,
        account_id: AccountId,
        role: AccountRole,
    ) -> Result<Option<Profile>, RepositoryError> {
        let sql = format!(
            "SELECT {PROFILE_COLUMNS} FROM {} WHERE account_id = $1",
            profile_table(role)
        );

        match role {
            AccountRole::Customer => sqlx::query_as::<_, CustomerProfileRow>(&sql)
                .bind(account_id.as_i32())
                .fetch_optional(self.pool)
                .await?
                .map(TryInto::try_into)
                .transpose(),
            AccountRole::Dealer => sqlx::query_as::<_, DealerProfileRow>(&sql)
                .bind(account_id.as_i32())
                .fetch_optional(self.pool)
                .await?
                .map(TryInto::try_into)
                .transpose(),
        }
    }

    /// Update the profile subtype.
    ///
    /// The KT id is immutable; editing the subtype keeps the originally
    /// allocated prefix.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account has no profile.
    pub async fn update_kind(
        &self,
        account_id: AccountId,
        kind: ProfileKind,
    ) -> Result<Profile, RepositoryError> {
        let sql = format!(
            "UPDATE {} SET kind = $1, updated_at = NOW()
             WHERE account_id = $2
             RETURNING {PROFILE_COLUMNS}",
            profile_table(kind.role())
        );

        match kind {
            ProfileKind::Customer(customer_kind) => sqlx::query_as::<_, CustomerProfileRow>(&sql)
                .bind(customer_kind)
                .bind(account_id.as_i32())
                .fetch_optional(self.pool)
                .await?
                .ok_or(RepositoryError::NotFound)?
                .try_into(),
            ProfileKind::Dealer(dealer_kind) => sqlx::query_as::<_, DealerProfileRow>(&sql)
                .bind(dealer_kind)
                .bind(account_id.as_i32())
                .fetch_optional(self.pool)
                .await?
                .ok_or(RepositoryError::NotFound)?
                .try_into(),
        }
    }

    /// Update the profile picture path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account has no profile.
    pub async fn update_picture(
        &self,
        account_id: AccountId,
        role: AccountRole,
        picture: &str,
    ) -> Result<Profile, RepositoryError> {
        let sql = format!(
            "UPDATE {} SET picture = $1, updated_at = NOW()
             WHERE account_id = $2
             RETURNING {PROFILE_COLUMNS}",
            profile_table(role)
        );

        match role {
            AccountRole::Customer => sqlx::query_as::<_, CustomerProfileRow>(&sql)
                .bind(picture)
                .bind(account_id.as_i32())
                .fetch_optional(self.pool)
                .await?
                .ok_or(RepositoryError::NotFound)?
                .try_into(),
            AccountRole::Dealer => sqlx::query_as::<_, DealerProfileRow>(&sql)
                .bind(picture)
                .bind(account_id.as_i32())
                .fetch_optional(self.pool)
                .await?
                .ok_or(RepositoryError::NotFound)?
                .try_into(),
        }
    }

    /// Record the generated QR code path on a profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account has no profile.
    pub async fn set_qr_code(
        &self,
        account_id: AccountId,
        role: AccountRole,
        qr_code: &str,
    ) -> Result<(), RepositoryError> {
        let sql = format!(
            "UPDATE {} SET qr_code = $1, updated_at = NOW() WHERE account_id = $2",
            profile_table(role)
        );

        let result = sqlx::query(&sql)
            .bind(qr_code)
            .bind(account_id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
