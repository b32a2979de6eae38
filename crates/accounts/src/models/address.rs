//! Address domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use kabaditech_core::{AccountId, AddressId};

/// An address book entry (domain type).
///
/// At most one address per account carries `is_default = true`; the
/// repository's demote-then-write transaction maintains the invariant.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    /// Unique address ID.
    pub id: AddressId,
    /// Owning account.
    pub account_id: AccountId,
    /// First address line (required).
    pub line1: String,
    /// Second address line.
    pub line2: Option<String>,
    /// Nearby landmark.
    pub landmark: Option<String>,
    /// City.
    pub city: String,
    /// State.
    pub state: String,
    /// Country.
    pub country: String,
    /// Postal code.
    pub postal_code: String,
    /// Whether this is the account's default address.
    pub is_default: bool,
    /// When the address was created.
    pub created_at: DateTime<Utc>,
    /// When the address was last updated.
    pub updated_at: DateTime<Utc>,
}
