//! Kabaditech Accounts library.
//!
//! This crate provides the account management service as a library,
//! allowing it to be tested and reused.
//!
//! # Subsystems
//!
//! - Account lifecycle: registration, email activation, login, deletion
//! - Role-specific profiles (customer/dealer) with KT identifiers
//! - Address book with the one-default-per-account invariant
//! - Supporting services: email delivery, QR code generation, token issuing

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
