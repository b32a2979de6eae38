//! Database operations for the accounts `PostgreSQL` schema.
//!
//! # Schema: `accounts`
//!
//! ## Tables
//!
//! - `account` - Base identity records
//! - `customer_profile` / `dealer_profile` - Role-specific profiles with KT ids
//! - `kt_id_counter` - Atomic per-prefix allocation counter
//! - `address` - Address book with the one-default-per-account invariant
//! - `activation_token` - Single-use email activation tokens (hashed)
//! - `refresh_token` - Revocable refresh tokens (hashed)
//!
//! Queries use the runtime sqlx API with explicit row structs; the two
//! read-modify-write sequences (KT id allocation, default-address demotion)
//! run inside single transactions.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/accounts/migrations/` and run via:
//! ```bash
//! cargo run -p kabaditech-cli -- migrate accounts
//! ```

pub mod accounts;
pub mod addresses;
pub mod profiles;
pub mod tokens;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use accounts::AccountRepository;
pub use addresses::AddressRepository;
pub use profiles::ProfileRepository;
pub use tokens::{ActivationTokenRepository, RefreshTokenRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
