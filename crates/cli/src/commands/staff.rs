//! Staff account management commands.
//!
//! # Usage
//!
//! ```bash
//! kt-cli staff create -e ops@kabaditech.in -n "Ops" -p <password>
//! ```
//!
//! # Environment Variables
//!
//! - `ACCOUNTS_DATABASE_URL` - `PostgreSQL` connection string

use kabaditech_core::Email;

use kabaditech_accounts::db::{AccountRepository, RepositoryError};
use kabaditech_accounts::services::auth::hash_password;

use super::{CliError, connect};

/// Create a new active staff account.
///
/// # Errors
///
/// Returns an error if the email is invalid, the account already exists, or
/// the database is unreachable.
pub async fn create(email: &str, name: &str, password: &str) -> Result<(), CliError> {
    let email = Email::parse(email).map_err(|e| CliError::InvalidEmail(e.to_string()))?;

    let password_hash =
        hash_password(password).map_err(|e| CliError::Accounts(e.to_string()))?;

    let pool = connect().await?;

    let account = AccountRepository::new(&pool)
        .create_staff(&email, name, &password_hash)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => CliError::AccountExists(email.to_string()),
            other => CliError::Accounts(other.to_string()),
        })?;

    tracing::info!(id = %account.id, email = %account.email, "Staff account created");
    Ok(())
}
