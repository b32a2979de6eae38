//! Profile domain types.

use chrono::{DateTime, Utc};

use kabaditech_core::{AccountId, AccountRole, KtId, ProfileKind};

/// A role-specific profile (domain type).
///
/// Customer and dealer profiles live in separate tables but share this shape;
/// the `kind` field carries the role-qualified subtype. The KT identifier is
/// assigned once at creation and never changes, even if the subtype is later
/// edited.
#[derive(Debug, Clone)]
pub struct Profile {
    /// Row ID in the variant table.
    pub id: i32,
    /// Owning account (one-to-one).
    pub account_id: AccountId,
    /// Generated KT identifier (immutable).
    pub kt_id: KtId,
    /// Role-qualified subtype.
    pub kind: ProfileKind,
    /// Profile picture path relative to the media root.
    pub picture: String,
    /// Generated QR code path relative to the media root, when present.
    pub qr_code: Option<String>,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
    /// When the profile was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// The role this profile variant belongs to.
    #[must_use]
    pub const fn role(&self) -> AccountRole {
        self.kind.role()
    }
}
