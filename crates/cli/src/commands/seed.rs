//! Seed the database with development accounts.
//!
//! Creates one customer (Personal) and one dealer (Kabadi) with known
//! credentials, already activated, so the API can be exercised without going
//! through the email flow.
//!
//! # Usage
//!
//! ```bash
//! kt-cli seed
//! ```

use kabaditech_core::{AccountRole, CustomerKind, DealerKind, ProfileKind};

use kabaditech_accounts::db::ProfileRepository;
use kabaditech_accounts::services::auth::{AuthError, AuthService};

use super::{CliError, connect};

/// Known development credentials.
const SEED_PASSWORD: &str = "kt-dev-password";

const SEED_ACCOUNTS: &[(&str, &str, AccountRole, ProfileKind)] = &[
    (
        "customer@kabaditech.test",
        "Dev Customer",
        AccountRole::Customer,
        ProfileKind::Customer(CustomerKind::Personal),
    ),
    (
        "dealer@kabaditech.test",
        "Dev Dealer",
        AccountRole::Dealer,
        ProfileKind::Dealer(DealerKind::Kabadi),
    ),
];

/// Seed development accounts.
///
/// Re-running is harmless: existing accounts are skipped.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a write fails.
pub async fn dev_accounts() -> Result<(), CliError> {
    let pool = connect().await?;
    let auth = AuthService::new(&pool);
    let profiles = ProfileRepository::new(&pool);

    for &(email, name, role, kind) in SEED_ACCOUNTS {
        let account = match auth.register(email, name, SEED_PASSWORD, role).await {
            Ok(account) => account,
            Err(AuthError::EmailTaken) => {
                tracing::info!(email, "seed account already exists, skipping");
                continue;
            }
            Err(e) => return Err(CliError::Accounts(e.to_string())),
        };

        profiles
            .create(account.id, kind)
            .await
            .map_err(|e| CliError::Accounts(e.to_string()))?;

        // Seeded accounts skip the email flow
        sqlx::query("UPDATE accounts.account SET is_active = TRUE WHERE id = $1")
            .bind(account.id.as_i32())
            .execute(&pool)
            .await?;

        tracing::info!(email, password = SEED_PASSWORD, "seed account created");
    }

    Ok(())
}
