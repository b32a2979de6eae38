//! Account domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kabaditech_core::{AccountId, AccountRole, Email};

/// A Kabaditech account (domain type).
///
/// The password hash never leaves the repository layer; credential checks go
/// through `AuthService`.
#[derive(Debug, Clone)]
pub struct Account {
    /// Unique account ID.
    pub id: AccountId,
    /// Account's email address (the identity key).
    pub email: Email,
    /// Display name.
    pub full_name: String,
    /// Role the account signed up with.
    pub role: AccountRole,
    /// Whether the account completed email activation.
    pub is_active: bool,
    /// Staff flag (operational tooling access).
    pub is_staff: bool,
    /// Admin flag.
    pub is_admin: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The authenticated requester, decoded from a bearer token.
///
/// Carried through handlers by the `RequireAccount` extractor; deliberately
/// small so it can live inside JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAccount {
    /// Account ID.
    pub id: AccountId,
    /// Email address at token issue time.
    pub email: Email,
    /// Account role (decides which profile endpoints are reachable).
    pub role: AccountRole,
}

impl From<&Account> for CurrentAccount {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            role: account.role,
        }
    }
}
