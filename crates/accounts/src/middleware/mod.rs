//! Middleware and extractors for the accounts API.

pub mod auth;

pub use auth::RequireAccount;
