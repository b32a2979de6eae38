//! Integration tests for the Kabaditech accounts service.
//!
//! # Running Tests
//!
//! ```bash
//! # Run migrations and seed the development accounts
//! cargo run -p kabaditech-cli -- migrate accounts
//! cargo run -p kabaditech-cli -- seed
//!
//! # Start the service
//! cargo run -p kabaditech-accounts
//!
//! # Run the (ignored-by-default) integration tests
//! cargo test -p kabaditech-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `accounts_auth` - Registration, activation and login behavior
//! - `profiles` - KT identifier allocation and role-scoped profile access
//! - `addresses` - The one-default-per-account invariant

#![cfg_attr(not(test), forbid(unsafe_code))]

use reqwest::Client;
use serde_json::{Value, json};

/// Credentials created by `kt-cli seed`.
pub const SEED_CUSTOMER_EMAIL: &str = "customer@kabaditech.test";
/// Credentials created by `kt-cli seed`.
pub const SEED_DEALER_EMAIL: &str = "dealer@kabaditech.test";
/// Credentials created by `kt-cli seed`.
pub const SEED_PASSWORD: &str = "kt-dev-password";

/// Shared context for exercising a running accounts service.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Build a context against `ACCOUNTS_BASE_URL` (default localhost:3000).
    #[must_use]
    pub fn new() -> Self {
        let base_url = std::env::var("ACCOUNTS_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let client = Client::builder()
            .build()
            .expect("Failed to create HTTP client");

        Self { client, base_url }
    }

    /// A unique email address for this test run.
    #[must_use]
    pub fn unique_email(prefix: &str) -> String {
        format!("{prefix}-{}@kabaditech.test", uuid::Uuid::new_v4().simple())
    }

    /// Register an account; returns the raw response.
    pub async fn register(
        &self,
        email: &str,
        account_type: &str,
        profile_type: &str,
    ) -> reqwest::Response {
        self.client
            .post(format!("{}/register", self.base_url))
            .json(&json!({
                "full_name": "Test Account",
                "email": email,
                "password": "integration-pass",
                "password2": "integration-pass",
                "account_type": account_type,
                "profile_type": profile_type,
            }))
            .send()
            .await
            .expect("Failed to send register request")
    }

    /// Log in; returns the parsed response body on 200.
    pub async fn login(&self, email: &str, password: &str, user_type: &str) -> Option<Value> {
        let resp = self
            .client
            .post(format!("{}/login", self.base_url))
            .json(&json!({
                "email": email,
                "password": password,
                "user_type": user_type,
            }))
            .send()
            .await
            .expect("Failed to send login request");

        if resp.status().is_success() {
            Some(resp.json().await.expect("Failed to parse login response"))
        } else {
            None
        }
    }

    /// Log in with the seeded dealer and return the access token.
    pub async fn dealer_access_token(&self) -> String {
        let body = self
            .login(SEED_DEALER_EMAIL, SEED_PASSWORD, "dealer")
            .await
            .expect("Seeded dealer login failed - run `kt-cli seed` first");

        body["access"]
            .as_str()
            .expect("login response missing access token")
            .to_string()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
