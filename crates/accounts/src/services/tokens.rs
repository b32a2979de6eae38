//! Session token service.
//!
//! Issues short-lived HS256 access tokens carrying the requester's identity,
//! plus opaque refresh tokens that are sha256-hashed before they touch the
//! database. The same hash helper covers activation tokens.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use kabaditech_core::{AccountId, AccountRole, Email};

use crate::models::CurrentAccount;

/// Access token lifetime.
const ACCESS_TOKEN_MINUTES: i64 = 15;

/// Refresh token lifetime.
const REFRESH_TOKEN_DAYS: i64 = 7;

/// Errors that can occur when issuing or validating tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token's signature or structure is invalid.
    #[error("invalid token")]
    Invalid,

    /// The token is past its expiry.
    #[error("expired token")]
    Expired,

    /// Token encoding failed.
    #[error("token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

/// JWT claims for access tokens.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Account id.
    sub: i32,
    /// Email at issue time.
    email: String,
    /// Account role.
    role: AccountRole,
    /// Expiry (unix seconds).
    exp: i64,
    /// Issued at (unix seconds).
    iat: i64,
}

/// Issues and validates session tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    /// Create a new token service from the configured signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
        }
    }

    /// Issue an access token for an authenticated account.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` if signing fails.
    pub fn issue_access(&self, account: &CurrentAccount) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: account.id.as_i32(),
            email: account.email.to_string(),
            role: account.role,
            exp: (now + Duration::minutes(ACCESS_TOKEN_MINUTES)).timestamp(),
            iat: now.timestamp(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Validate an access token and recover the requester.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` for stale tokens and
    /// `TokenError::Invalid` for anything else that fails validation.
    pub fn validate_access(&self, token: &str) -> Result<CurrentAccount, TokenError> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            if matches!(e.kind(), ErrorKind::ExpiredSignature) {
                TokenError::Expired
            } else {
                TokenError::Invalid
            }
        })?;

        let email = Email::parse(&data.claims.email).map_err(|_| TokenError::Invalid)?;

        Ok(CurrentAccount {
            id: AccountId::new(data.claims.sub),
            email,
            role: data.claims.role,
        })
    }

    /// Generate an opaque random token (activation or refresh).
    ///
    /// 32 bytes of OS randomness, URL-safe base64 so it survives being
    /// embedded in an activation link.
    #[must_use]
    pub fn generate_opaque(&self) -> String {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Hash an opaque token for storage.
    #[must_use]
    pub fn hash_opaque(&self, token: &str) -> String {
        let digest = Sha256::digest(token.as_bytes());
        base16_encode(&digest)
    }

    /// Expiry timestamp for a refresh token issued now.
    #[must_use]
    pub fn refresh_expiry(&self) -> DateTime<Utc> {
        Utc::now() + Duration::days(REFRESH_TOKEN_DAYS)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

/// Lowercase hex encoding without pulling in another dependency.
fn base16_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "k9#mQ2$vX7@pL4!wZ8&nR5*tY1^cF6%d";

    fn service() -> TokenService {
        TokenService::new(&SecretString::from(TEST_SECRET))
    }

    fn requester() -> CurrentAccount {
        CurrentAccount {
            id: AccountId::new(42),
            email: Email::parse("dealer@example.com").unwrap(),
            role: AccountRole::Dealer,
        }
    }

    #[test]
    fn test_access_token_roundtrip() {
        let service = service();
        let token = service.issue_access(&requester()).unwrap();

        let decoded = service.validate_access(&token).unwrap();
        assert_eq!(decoded.id, AccountId::new(42));
        assert_eq!(decoded.email.as_str(), "dealer@example.com");
        assert_eq!(decoded.role, AccountRole::Dealer);
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = Utc::now().timestamp();
        let claims = serde_json::json!({
            "sub": 42,
            "email": "dealer@example.com",
            "role": "dealer",
            // Past the default validation leeway
            "exp": now - 3600,
            "iat": now - 7200,
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            service().validate_access(&token),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let service = service();
        let token = service.issue_access(&requester()).unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(matches!(
            service.validate_access(&tampered),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let token = service().issue_access(&requester()).unwrap();

        let other = TokenService::new(&SecretString::from("z1!bW8@qT3#eH6$jM9%uK2^sP5&xV7*a"));
        assert!(matches!(
            other.validate_access(&token),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_opaque_tokens_are_unique() {
        let service = service();
        let a = service.generate_opaque();
        let b = service.generate_opaque();
        assert_ne!(a, b);
        // 32 bytes of URL-safe base64 without padding
        assert_eq!(a.len(), 43);
    }

    #[test]
    fn test_hash_opaque_is_deterministic() {
        let service = service();
        let token = service.generate_opaque();
        let first = service.hash_opaque(&token);
        let second = service.hash_opaque(&token);
        assert_eq!(first, second);
        // sha256 hex
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        // and the raw token never equals its stored form
        assert_ne!(first, token);
    }

    #[test]
    fn test_refresh_expiry_is_in_the_future() {
        assert!(service().refresh_expiry() > Utc::now());
    }
}
