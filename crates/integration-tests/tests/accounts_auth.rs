//! Integration tests for registration, activation and login.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The accounts server running (cargo run -p kabaditech-accounts)
//! - Seeded development accounts (kt-cli seed)
//!
//! Run with: cargo test -p kabaditech-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::Value;

use kabaditech_integration_tests::{SEED_CUSTOMER_EMAIL, SEED_PASSWORD, TestContext};

// ============================================================================
// Registration Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_register_creates_inactive_account_with_kt_id() {
    let ctx = TestContext::new();
    let email = TestContext::unique_email("register");

    let resp = ctx.register(&email, "dealer", "kabadi").await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = resp.json().await.expect("Failed to parse response");
    assert!(body["kt_id"].as_str().expect("missing kt_id").starts_with("KTDK"));
    assert_eq!(body["account"]["is_active"], false);
    assert_eq!(body["account"]["email"], email.as_str());
}

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_register_duplicate_email_rejected() {
    let ctx = TestContext::new();
    let email = TestContext::unique_email("dup");

    let first = ctx.register(&email, "customer", "personal").await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = ctx.register(&email, "customer", "personal").await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);

    let body: Value = second.json().await.expect("Failed to parse response");
    assert!(
        body["message"]
            .as_str()
            .expect("missing message")
            .contains("already exists")
    );
}

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_register_password_mismatch_creates_nothing() {
    let ctx = TestContext::new();
    let email = TestContext::unique_email("mismatch");

    let resp = ctx
        .client
        .post(format!("{}/register", ctx.base_url))
        .json(&serde_json::json!({
            "full_name": "Test Account",
            "email": email,
            "password": "integration-pass",
            "password2": "something else",
            "account_type": "customer",
            "profile_type": "personal",
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert!(body["field_errors"]["password2"].is_string());

    // No account was created: the same email registers cleanly afterwards
    let retry = ctx.register(&email, "customer", "personal").await;
    assert_eq!(retry.status(), StatusCode::CREATED);
}

// ============================================================================
// Login Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_login_inactive_account_is_forbidden() {
    let ctx = TestContext::new();
    let email = TestContext::unique_email("inactive");

    let resp = ctx.register(&email, "dealer", "collector").await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Correct credentials, but the account never activated
    let resp = ctx
        .client
        .post(format!("{}/login", ctx.base_url))
        .json(&serde_json::json!({
            "email": email,
            "password": "integration-pass",
            "user_type": "dealer",
        }))
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_login_seeded_customer_returns_token_pair() {
    let ctx = TestContext::new();

    let body = ctx
        .login(SEED_CUSTOMER_EMAIL, SEED_PASSWORD, "customer")
        .await
        .expect("Seeded customer login failed - run `kt-cli seed` first");

    assert!(body["access"].is_string());
    assert!(body["refresh"].is_string());
    assert_eq!(body["account"]["email"], SEED_CUSTOMER_EMAIL);
}

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_login_wrong_password_is_unauthorized() {
    let ctx = TestContext::new();

    let resp = ctx
        .client
        .post(format!("{}/login", ctx.base_url))
        .json(&serde_json::json!({
            "email": SEED_CUSTOMER_EMAIL,
            "password": "wrong password",
            "user_type": "customer",
        }))
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_login_role_mismatch_is_unauthorized() {
    let ctx = TestContext::new();

    // Valid customer credentials presented as a dealer login
    let resp = ctx
        .client
        .post(format!("{}/login", ctx.base_url))
        .json(&serde_json::json!({
            "email": SEED_CUSTOMER_EMAIL,
            "password": SEED_PASSWORD,
            "user_type": "dealer",
        }))
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Token Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_refresh_rotates_access_token() {
    let ctx = TestContext::new();

    let body = ctx
        .login(SEED_CUSTOMER_EMAIL, SEED_PASSWORD, "customer")
        .await
        .expect("Seeded customer login failed");

    let refresh = body["refresh"].as_str().expect("missing refresh token");

    let resp = ctx
        .client
        .post(format!("{}/token/refresh", ctx.base_url))
        .json(&serde_json::json!({ "refresh": refresh }))
        .send()
        .await
        .expect("Failed to send refresh request");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert!(body["access"].is_string());
}

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_refresh_with_garbage_token_is_unauthorized() {
    let ctx = TestContext::new();

    let resp = ctx
        .client
        .post(format!("{}/token/refresh", ctx.base_url))
        .json(&serde_json::json!({ "refresh": "not-a-token" }))
        .send()
        .await
        .expect("Failed to send refresh request");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_account_endpoint_requires_bearer_token() {
    let ctx = TestContext::new();

    let resp = ctx
        .client
        .get(format!("{}/account", ctx.base_url))
        .send()
        .await
        .expect("Failed to send account request");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
