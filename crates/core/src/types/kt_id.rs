//! KT identifiers - human-readable, prefixed profile identifiers.
//!
//! Every profile is assigned one identifier at creation, of the form
//! `<PREFIX><100000 + serial>` where the prefix encodes the profile subtype
//! (e.g. `KTCP100001` for the first personal customer). The identifier is
//! immutable once assigned.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Offset added to the per-prefix serial so every identifier has a fixed
/// six-digit numeric part from the first allocation onwards.
const SERIAL_BASE: i64 = 100_000;

/// Errors that can occur when parsing a [`KtId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KtIdError {
    /// The identifier does not start with a known prefix.
    #[error("unknown KT id prefix in '{0}'")]
    UnknownPrefix(String),
    /// The part after the prefix is not a number above the serial base.
    #[error("invalid KT id numeric part in '{0}'")]
    InvalidNumber(String),
}

/// Identifier prefix, one per profile subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdPrefix {
    /// Customer / Personal.
    Ktcp,
    /// Customer / Organization.
    Ktco,
    /// Dealer / Kabadi.
    Ktdk,
    /// Dealer / Collector.
    Ktdc,
    /// Dealer / Recycler.
    Ktdr,
}

impl IdPrefix {
    /// All known prefixes.
    pub const ALL: [Self; 5] = [Self::Ktcp, Self::Ktco, Self::Ktdk, Self::Ktdc, Self::Ktdr];

    /// The prefix as it appears in identifiers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ktcp => "KTCP",
            Self::Ktco => "KTCO",
            Self::Ktdk => "KTDK",
            Self::Ktdc => "KTDC",
            Self::Ktdr => "KTDR",
        }
    }
}

impl fmt::Display for IdPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A KT profile identifier such as `KTDK100007`.
///
/// Constructed either by [`KtId::allocate`] from a counter value or by
/// [`KtId::parse`] from a stored string. The numeric part is strictly
/// increasing per prefix, so later allocations compare greater.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct KtId(String);

impl KtId {
    /// Build the identifier for the `serial`-th allocation of a prefix.
    ///
    /// Serials start at 1; `allocate(Ktcp, 1)` is `KTCP100001`.
    #[must_use]
    pub fn allocate(prefix: IdPrefix, serial: i64) -> Self {
        Self(format!("{}{}", prefix.as_str(), SERIAL_BASE + serial))
    }

    /// Parse a stored identifier, validating prefix and numeric part.
    ///
    /// # Errors
    ///
    /// Returns [`KtIdError::UnknownPrefix`] when no known prefix matches and
    /// [`KtIdError::InvalidNumber`] when the remainder is not a number above
    /// the serial base.
    pub fn parse(s: &str) -> Result<Self, KtIdError> {
        let prefix = IdPrefix::ALL
            .into_iter()
            .find(|p| s.starts_with(p.as_str()))
            .ok_or_else(|| KtIdError::UnknownPrefix(s.to_owned()))?;

        s.get(prefix.as_str().len()..)
            .and_then(|rest| rest.parse::<i64>().ok())
            .filter(|n| *n > SERIAL_BASE)
            .ok_or_else(|| KtIdError::InvalidNumber(s.to_owned()))?;

        Ok(Self(s.to_owned()))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `KtId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// The subtype prefix of this identifier.
    #[must_use]
    pub fn prefix(&self) -> IdPrefix {
        // Parse validated the prefix; fall back to scanning for stored values.
        IdPrefix::ALL
            .into_iter()
            .find(|p| self.0.starts_with(p.as_str()))
            .unwrap_or(IdPrefix::Ktcp)
    }

    /// The allocation serial (1 for the first identifier of a prefix).
    #[must_use]
    pub fn serial(&self) -> i64 {
        self.0
            .get(self.prefix().as_str().len()..)
            .and_then(|rest| rest.parse::<i64>().ok())
            .map_or(0, |n| n - SERIAL_BASE)
    }
}

impl fmt::Display for KtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for KtId {
    type Err = KtIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for KtId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for KtId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for KtId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for KtId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_first_allocation_per_prefix() {
        assert_eq!(KtId::allocate(IdPrefix::Ktcp, 1).as_str(), "KTCP100001");
        assert_eq!(KtId::allocate(IdPrefix::Ktco, 1).as_str(), "KTCO100001");
        assert_eq!(KtId::allocate(IdPrefix::Ktdk, 1).as_str(), "KTDK100001");
        assert_eq!(KtId::allocate(IdPrefix::Ktdc, 1).as_str(), "KTDC100001");
        assert_eq!(KtId::allocate(IdPrefix::Ktdr, 1).as_str(), "KTDR100001");
    }

    #[test]
    fn test_later_allocations_compare_greater() {
        let first = KtId::allocate(IdPrefix::Ktdk, 1);
        let second = KtId::allocate(IdPrefix::Ktdk, 2);
        assert!(second > first);
        assert!(second.serial() > first.serial());
    }

    #[test]
    fn test_parse_roundtrip() {
        let id = KtId::parse("KTDK100042").unwrap();
        assert_eq!(id.prefix(), IdPrefix::Ktdk);
        assert_eq!(id.serial(), 42);
        assert_eq!(id.to_string(), "KTDK100042");
    }

    #[test]
    fn test_parse_unknown_prefix() {
        assert_eq!(
            KtId::parse("ABCD100001"),
            Err(KtIdError::UnknownPrefix("ABCD100001".to_owned()))
        );
    }

    #[test]
    fn test_parse_invalid_number() {
        assert!(matches!(
            KtId::parse("KTCP"),
            Err(KtIdError::InvalidNumber(_))
        ));
        assert!(matches!(
            KtId::parse("KTCPxyz"),
            Err(KtIdError::InvalidNumber(_))
        ));
        // Numeric part must sit above the serial base.
        assert!(matches!(
            KtId::parse("KTCP99999"),
            Err(KtIdError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_serde_transparent() {
        let id = KtId::allocate(IdPrefix::Ktco, 3);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"KTCO100003\"");
    }
}
