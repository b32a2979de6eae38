//! Domain types for the accounts service.
//!
//! These types represent validated domain objects separate from database row
//! types; repositories convert rows into them.

pub mod account;
pub mod address;
pub mod profile;
pub mod token;

pub use account::{Account, CurrentAccount};
pub use address::Address;
pub use profile::Profile;
pub use token::{ActivationToken, RefreshToken};
