//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod staff;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Account already exists.
    #[error("Account already exists with email: {0}")]
    AccountExists(String),

    /// Anything surfaced from the accounts service layer.
    #[error("{0}")]
    Accounts(String),
}

/// Connect to the accounts database using the standard environment variables.
///
/// # Errors
///
/// Returns `CliError::MissingEnvVar` when no connection string is configured.
pub async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("ACCOUNTS_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("ACCOUNTS_DATABASE_URL"))?;

    Ok(kabaditech_accounts::db::create_pool(&database_url).await?)
}
