//! Kabaditech Core - Shared types library.
//!
//! This crate provides common types used across all Kabaditech components:
//! - `accounts` - User account management service (registration, profiles,
//!   addresses)
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, KT identifiers
//!   and account roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
