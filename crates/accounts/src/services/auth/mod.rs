//! Authentication service.
//!
//! Registration, credential checks and account activation over argon2
//! password hashes. Credential verification is one explicit function; there
//! is exactly one verification strategy, so no backend indirection exists.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use kabaditech_core::{AccountId, AccountRole, Email};

use crate::db::RepositoryError;
use crate::db::accounts::AccountRepository;
use crate::db::tokens::ActivationTokenRepository;
use crate::models::Account;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
///
/// Handles account registration, login credential checks and activation.
pub struct AuthService<'a> {
    accounts: AccountRepository<'a>,
    activation_tokens: ActivationTokenRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            accounts: AccountRepository::new(pool),
            activation_tokens: ActivationTokenRepository::new(pool),
        }
    }

    /// Register a new inactive account with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::EmailTaken` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        full_name: &str,
        password: &str,
        role: AccountRole,
    ) -> Result<Account, AuthError> {
        // Validate email
        let email = Email::parse(email)?;

        // Validate password
        validate_password(password)?;

        // Hash password
        let password_hash = hash_password(password)?;

        // Create account (inactive until the emailed token is consumed)
        let account = self
            .accounts
            .create(&email, full_name, &password_hash, role)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        Ok(account)
    }

    /// Check credentials for login.
    ///
    /// The single credential-verification function: given email + secret +
    /// expected role, return the matching account or an error. The active
    /// check runs last so an inactive account with correct credentials is
    /// distinguishable (403) from a failed credential check (401).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for unknown email or wrong
    /// password, `AuthError::RoleMismatch` when the credentials belong to the
    /// other role, and `AuthError::AccountInactive` for unactivated accounts.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        role: AccountRole,
    ) -> Result<Account, AuthError> {
        // Validate email format
        let email = Email::parse(email)?;

        // Get account with password hash
        let (account, password_hash) = self
            .accounts
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        // Verify password
        verify_password(password, &password_hash)?;

        if account.role != role {
            return Err(AuthError::RoleMismatch);
        }

        if !account.is_active {
            return Err(AuthError::AccountInactive);
        }

        Ok(account)
    }

    /// Consume an activation token and activate the account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidActivationToken` when no token matches the
    /// account/hash pair, and `AuthError::ActivationTokenSpent` when the
    /// token is expired or was already used.
    pub async fn activate(
        &self,
        account_id: AccountId,
        token_hash: &str,
    ) -> Result<(), AuthError> {
        let token = self
            .activation_tokens
            .get(account_id, token_hash)
            .await?
            .ok_or(AuthError::InvalidActivationToken)?;

        if !token.is_valid() {
            return Err(AuthError::ActivationTokenSpent);
        }

        // The repository re-checks used_at inside the transaction, closing
        // the race with a concurrent activation of the same token.
        self.accounts
            .activate(account_id, token.id)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::ActivationTokenSpent,
                RepositoryError::NotFound => AuthError::InvalidActivationToken,
                other => AuthError::Repository(other),
            })
    }
}

// =============================================================================
// Password helpers
// =============================================================================

/// Validate password strength requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` when the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with argon2.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::PasswordHash)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored argon2 hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` when the password does not match.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| AuthError::PasswordHash)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(matches!(
            verify_password("wrong horse battery", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_password_too_short() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_validate_password_ok() {
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_garbage_stored_hash_is_not_a_credential_error() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::PasswordHash)
        ));
    }
}
