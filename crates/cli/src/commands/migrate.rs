//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! kt-cli migrate accounts
//! ```
//!
//! # Environment Variables
//!
//! - `ACCOUNTS_DATABASE_URL` - `PostgreSQL` connection string for the
//!   accounts database (falls back to `DATABASE_URL`)

use super::{CliError, connect};

/// Run accounts database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn accounts() -> Result<(), CliError> {
    tracing::info!("Connecting to accounts database...");
    let pool = connect().await?;

    tracing::info!("Running accounts migrations...");
    sqlx::migrate!("../accounts/migrations").run(&pool).await?;

    tracing::info!("Accounts migrations complete!");
    Ok(())
}
