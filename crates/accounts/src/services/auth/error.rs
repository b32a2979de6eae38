//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] kabaditech_core::EmailError),

    /// Invalid credentials (wrong password or account not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Credentials are valid but for the other role.
    #[error("account role mismatch")]
    RoleMismatch,

    /// Credentials are valid but the account never completed activation.
    #[error("account is not active")]
    AccountInactive,

    /// Email already registered.
    #[error("email already registered")]
    EmailTaken,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Activation token unknown or malformed.
    #[error("invalid activation token")]
    InvalidActivationToken,

    /// Activation token expired or already consumed.
    #[error("activation token expired or already used")]
    ActivationTokenSpent,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
