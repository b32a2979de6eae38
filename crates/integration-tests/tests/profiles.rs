//! Integration tests for KT identifier allocation and profile access.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The accounts server running (cargo run -p kabaditech-accounts)
//! - Seeded development accounts (kt-cli seed)
//!
//! Run with: cargo test -p kabaditech-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::Value;

use kabaditech_core::KtId;
use kabaditech_integration_tests::TestContext;

/// Register an account and return the assigned KT id.
async fn register_for_kt_id(ctx: &TestContext, account_type: &str, profile_type: &str) -> KtId {
    let email = TestContext::unique_email(profile_type);
    let resp = ctx.register(&email, account_type, profile_type).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = resp.json().await.expect("Failed to parse response");
    let raw = body["kt_id"].as_str().expect("missing kt_id");
    KtId::parse(raw).expect("response carried a malformed KT id")
}

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_dealer_kabadi_ids_are_prefixed_and_increasing() {
    let ctx = TestContext::new();

    let first = register_for_kt_id(&ctx, "dealer", "kabadi").await;
    let second = register_for_kt_id(&ctx, "dealer", "kabadi").await;

    assert!(first.as_str().starts_with("KTDK"));
    assert!(second.as_str().starts_with("KTDK"));
    assert!(
        second.serial() > first.serial(),
        "second allocation must have a strictly greater suffix"
    );
}

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_each_subtype_gets_its_own_prefix() {
    let ctx = TestContext::new();

    let personal = register_for_kt_id(&ctx, "customer", "personal").await;
    let organization = register_for_kt_id(&ctx, "customer", "organization").await;
    let recycler = register_for_kt_id(&ctx, "dealer", "recycler").await;

    assert!(personal.as_str().starts_with("KTCP"));
    assert!(organization.as_str().starts_with("KTCO"));
    assert!(recycler.as_str().starts_with("KTDR"));
}

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_concurrent_registrations_get_unique_ids() {
    // Fire a burst of same-subtype registrations concurrently; every
    // allocation must come back unique.
    let mut handles = Vec::new();
    for _ in 0..8 {
        let ctx = TestContext::new();
        handles.push(tokio::spawn(async move {
            register_for_kt_id(&ctx, "dealer", "kabadi").await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.expect("registration task panicked"));
    }

    let mut deduped = ids.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), ids.len(), "duplicate KT id allocated");
}

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_profile_endpoint_is_role_scoped() {
    let ctx = TestContext::new();
    let token = ctx.dealer_access_token().await;

    // The seeded dealer can read its own profile
    let resp = ctx
        .client
        .get(format!("{}/dealer-profile", ctx.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to fetch dealer profile");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to parse response");
    assert!(body["kt_id"].as_str().expect("missing kt_id").starts_with("KTDK"));
    assert_eq!(body["account_type"], "dealer");

    // The customer endpoint rejects a dealer token outright
    let resp = ctx
        .client
        .get(format!("{}/customer-profile", ctx.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to fetch customer profile");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
