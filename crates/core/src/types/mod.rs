//! Core types for Kabaditech.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod kt_id;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use kt_id::{IdPrefix, KtId, KtIdError};
pub use role::{AccountRole, CustomerKind, DealerKind, ProfileKind};
