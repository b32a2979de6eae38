//! Account roles and profile subtypes.

use serde::{Deserialize, Serialize};

use crate::types::kt_id::IdPrefix;

/// The role a Kabaditech account signs up with.
///
/// Every account is exactly one of the two; the role decides which profile
/// variant the account owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "accounts.account_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    /// Sells scrap to dealers.
    Customer,
    /// Buys and processes scrap.
    Dealer,
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Dealer => write!(f, "dealer"),
        }
    }
}

impl std::str::FromStr for AccountRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "dealer" => Ok(Self::Dealer),
            _ => Err(format!("invalid account role: {s}")),
        }
    }
}

/// Customer profile subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "accounts.customer_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum CustomerKind {
    /// An individual household seller.
    Personal,
    /// A company or institution selling in bulk.
    Organization,
}

impl CustomerKind {
    /// The KT identifier prefix allocated to this subtype.
    #[must_use]
    pub const fn id_prefix(self) -> IdPrefix {
        match self {
            Self::Personal => IdPrefix::Ktcp,
            Self::Organization => IdPrefix::Ktco,
        }
    }
}

impl std::fmt::Display for CustomerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Personal => write!(f, "personal"),
            Self::Organization => write!(f, "organization"),
        }
    }
}

impl std::str::FromStr for CustomerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(Self::Personal),
            "organization" => Ok(Self::Organization),
            _ => Err(format!("invalid customer profile type: {s}")),
        }
    }
}

/// Dealer profile subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "accounts.dealer_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DealerKind {
    /// Door-to-door scrap dealer.
    Kabadi,
    /// Aggregates scrap from kabadis.
    Collector,
    /// Processes collected scrap.
    Recycler,
}

impl DealerKind {
    /// The KT identifier prefix allocated to this subtype.
    #[must_use]
    pub const fn id_prefix(self) -> IdPrefix {
        match self {
            Self::Kabadi => IdPrefix::Ktdk,
            Self::Collector => IdPrefix::Ktdc,
            Self::Recycler => IdPrefix::Ktdr,
        }
    }
}

impl std::fmt::Display for DealerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kabadi => write!(f, "kabadi"),
            Self::Collector => write!(f, "collector"),
            Self::Recycler => write!(f, "recycler"),
        }
    }
}

impl std::str::FromStr for DealerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kabadi" => Ok(Self::Kabadi),
            "collector" => Ok(Self::Collector),
            "recycler" => Ok(Self::Recycler),
            _ => Err(format!("invalid dealer profile type: {s}")),
        }
    }
}

/// A role-qualified profile subtype.
///
/// Registration payloads carry the role and the subtype as separate fields;
/// this type is the validated combination of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    Customer(CustomerKind),
    Dealer(DealerKind),
}

impl ProfileKind {
    /// Parse a subtype string in the context of an account role.
    ///
    /// # Errors
    ///
    /// Returns an error message when the subtype is not valid for the role.
    pub fn from_parts(role: AccountRole, subtype: &str) -> Result<Self, String> {
        match role {
            AccountRole::Customer => subtype.parse().map(Self::Customer),
            AccountRole::Dealer => subtype.parse().map(Self::Dealer),
        }
    }

    /// The account role this subtype belongs to.
    #[must_use]
    pub const fn role(self) -> AccountRole {
        match self {
            Self::Customer(_) => AccountRole::Customer,
            Self::Dealer(_) => AccountRole::Dealer,
        }
    }

    /// The KT identifier prefix allocated to this subtype.
    #[must_use]
    pub const fn id_prefix(self) -> IdPrefix {
        match self {
            Self::Customer(kind) => kind.id_prefix(),
            Self::Dealer(kind) => kind.id_prefix(),
        }
    }
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer(kind) => kind.fmt(f),
            Self::Dealer(kind) => kind.fmt(f),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in [AccountRole::Customer, AccountRole::Dealer] {
            let parsed: AccountRole = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_role_rejects_unknown() {
        assert!("reseller".parse::<AccountRole>().is_err());
    }

    #[test]
    fn test_profile_kind_from_parts() {
        let kind = ProfileKind::from_parts(AccountRole::Customer, "personal").unwrap();
        assert_eq!(kind, ProfileKind::Customer(CustomerKind::Personal));
        assert_eq!(kind.role(), AccountRole::Customer);

        let kind = ProfileKind::from_parts(AccountRole::Dealer, "recycler").unwrap();
        assert_eq!(kind, ProfileKind::Dealer(DealerKind::Recycler));
        assert_eq!(kind.role(), AccountRole::Dealer);
    }

    #[test]
    fn test_profile_kind_rejects_cross_role_subtype() {
        // A dealer subtype is not valid for a customer account and vice versa.
        assert!(ProfileKind::from_parts(AccountRole::Customer, "kabadi").is_err());
        assert!(ProfileKind::from_parts(AccountRole::Dealer, "personal").is_err());
    }

    #[test]
    fn test_prefix_mapping() {
        assert_eq!(CustomerKind::Personal.id_prefix(), IdPrefix::Ktcp);
        assert_eq!(CustomerKind::Organization.id_prefix(), IdPrefix::Ktco);
        assert_eq!(DealerKind::Kabadi.id_prefix(), IdPrefix::Ktdk);
        assert_eq!(DealerKind::Collector.id_prefix(), IdPrefix::Ktdc);
        assert_eq!(DealerKind::Recycler.id_prefix(), IdPrefix::Ktdr);
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&AccountRole::Dealer).unwrap();
        assert_eq!(json, "\"dealer\"");
        let json = serde_json::to_string(&DealerKind::Kabadi).unwrap();
        assert_eq!(json, "\"kabadi\"");
    }
}
