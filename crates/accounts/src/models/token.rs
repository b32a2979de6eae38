//! Token domain types.
//!
//! Both token kinds are stored hashed; the raw value exists only in the
//! response or email that delivered it.

use chrono::{DateTime, Utc};

use kabaditech_core::{AccountId, ActivationTokenId, RefreshTokenId};

/// A single-use account activation token record.
#[derive(Debug, Clone)]
pub struct ActivationToken {
    /// Unique identifier.
    pub id: ActivationTokenId,
    /// Account this token activates.
    pub account_id: AccountId,
    /// sha256 hash of the emailed token.
    pub token_hash: String,
    /// When the token was created.
    pub created_at: DateTime<Utc>,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
    /// When the token was consumed (None if unused).
    pub used_at: Option<DateTime<Utc>>,
}

impl ActivationToken {
    /// Returns true if this token has already been consumed.
    #[must_use]
    pub const fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    /// Returns true if this token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Returns true if this token can still be used.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.is_used() && !self.is_expired()
    }
}

/// A revocable refresh token record.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    /// Unique identifier.
    pub id: RefreshTokenId,
    /// Account this token belongs to.
    pub account_id: AccountId,
    /// sha256 hash of the issued token.
    pub token_hash: String,
    /// When the token was created.
    pub created_at: DateTime<Utc>,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
    /// When the token was revoked (None if live).
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    /// Returns true if this token is still usable.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.revoked_at.is_none() && Utc::now() <= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use kabaditech_core::AccountId;

    fn token(expires_in: Duration, used: bool) -> ActivationToken {
        ActivationToken {
            id: ActivationTokenId::new(1),
            account_id: AccountId::new(1),
            token_hash: "abc".to_owned(),
            created_at: Utc::now(),
            expires_at: Utc::now() + expires_in,
            used_at: used.then(Utc::now),
        }
    }

    #[test]
    fn test_fresh_token_is_valid() {
        assert!(token(Duration::days(3), false).is_valid());
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let t = token(Duration::seconds(-1), false);
        assert!(t.is_expired());
        assert!(!t.is_valid());
    }

    #[test]
    fn test_used_token_is_invalid() {
        let t = token(Duration::days(3), true);
        assert!(t.is_used());
        assert!(!t.is_valid());
    }
}
