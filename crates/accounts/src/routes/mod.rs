//! HTTP route handlers for the accounts API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (database ping)
//!
//! # Auth (public)
//! POST /register                   - Register account + profile, send activation email
//! GET  /email-verify/{uid}/{token} - Consume activation token
//! POST /login                      - Credential check, returns access + refresh tokens
//! POST /token/refresh              - Rotate the access token
//!
//! # Auth (bearer)
//! POST /logout                     - Revoke the presented refresh token
//!
//! # Account (bearer)
//! GET    /account                  - Basic fields of the requester's account
//! PUT    /account                  - Update display name
//! DELETE /account                  - Cascading delete (profile, addresses, tokens)
//!
//! # Profiles (bearer, role-scoped)
//! GET /customer-profile            - Customer profile of the requester
//! PUT /customer-profile            - Multipart update (subtype, picture, QR)
//! GET /dealer-profile              - Dealer profile of the requester
//! PUT /dealer-profile              - Multipart update (subtype, picture, QR)
//!
//! # Addresses (bearer)
//! GET    /address                  - List own addresses
//! POST   /address                  - Create address (may promote to default)
//! PUT    /address/{id}             - Partial update (may promote to default)
//! DELETE /address/{id}             - Delete (no default re-promotion)
//! ```

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

pub mod account;
pub mod address;
pub mod auth;
pub mod profile;

/// Build the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/register", post(auth::register))
        .route("/email-verify/{uid}/{token}", get(auth::email_verify))
        .route("/login", post(auth::login))
        .route("/token/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        // Account
        .route(
            "/account",
            get(account::show).put(account::update).delete(account::delete),
        )
        // Profiles
        .route(
            "/customer-profile",
            get(profile::show_customer).put(profile::update_customer),
        )
        .route(
            "/dealer-profile",
            get(profile::show_dealer).put(profile::update_dealer),
        )
        // Addresses
        .route("/address", get(address::list).post(address::create))
        .route(
            "/address/{id}",
            put(address::update).delete(address::delete),
        )
}
