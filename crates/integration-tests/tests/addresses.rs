//! Integration tests for the address book and its default-address invariant.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The accounts server running (cargo run -p kabaditech-accounts)
//! - Seeded development accounts (kt-cli seed)
//!
//! Run with: cargo test -p kabaditech-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};

use kabaditech_integration_tests::TestContext;

/// Create an address for the authenticated account; returns its id.
async fn create_address(ctx: &TestContext, token: &str, line1: &str, is_default: bool) -> i64 {
    let resp = ctx
        .client
        .post(format!("{}/address", ctx.base_url))
        .bearer_auth(token)
        .json(&json!({
            "line1": line1,
            "city": "Pune",
            "state": "Maharashtra",
            "country": "India",
            "postal_code": "411001",
            "is_default": is_default,
        }))
        .send()
        .await
        .expect("Failed to create address");

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("missing address id")
}

/// List the authenticated account's addresses.
async fn list_addresses(ctx: &TestContext, token: &str) -> Vec<Value> {
    let resp = ctx
        .client
        .get(format!("{}/address", ctx.base_url))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to list addresses");

    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("Failed to parse response")
}

/// Count addresses with the default flag set.
fn default_count(addresses: &[Value]) -> usize {
    addresses
        .iter()
        .filter(|a| a["is_default"] == true)
        .count()
}

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_promoting_an_address_demotes_the_previous_default() {
    let ctx = TestContext::new();
    let token = ctx.dealer_access_token().await;

    let addr1 = create_address(&ctx, &token, "1 First Street", true).await;
    let addr2 = create_address(&ctx, &token, "2 Second Street", false).await;

    // Promote addr2
    let resp = ctx
        .client
        .put(format!("{}/address/{addr2}", ctx.base_url))
        .bearer_auth(&token)
        .json(&json!({ "is_default": true }))
        .send()
        .await
        .expect("Failed to update address");
    assert_eq!(resp.status(), StatusCode::OK);

    let addresses = list_addresses(&ctx, &token).await;
    assert!(default_count(&addresses) <= 1, "more than one default address");

    for address in &addresses {
        let id = address["id"].as_i64().expect("missing id");
        if id == addr1 {
            assert_eq!(address["is_default"], false, "addr1 was not demoted");
        }
        if id == addr2 {
            assert_eq!(address["is_default"], true, "addr2 was not promoted");
        }
    }
}

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_invariant_holds_after_every_write_sequence() {
    let ctx = TestContext::new();
    let token = ctx.dealer_access_token().await;

    // A pile of writes, several of them promoting
    let a = create_address(&ctx, &token, "10 Invariant Road", true).await;
    let b = create_address(&ctx, &token, "11 Invariant Road", true).await;
    let c = create_address(&ctx, &token, "12 Invariant Road", false).await;

    for id in [a, c, b] {
        let resp = ctx
            .client
            .put(format!("{}/address/{id}", ctx.base_url))
            .bearer_auth(&token)
            .json(&json!({ "is_default": true }))
            .send()
            .await
            .expect("Failed to update address");
        assert_eq!(resp.status(), StatusCode::OK);

        let addresses = list_addresses(&ctx, &token).await;
        assert_eq!(default_count(&addresses), 1, "invariant broken after promote");
    }
}

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_deleting_the_default_leaves_zero_defaults() {
    let ctx = TestContext::new();
    let token = ctx.dealer_access_token().await;

    let id = create_address(&ctx, &token, "99 Transient Lane", true).await;

    let resp = ctx
        .client
        .delete(format!("{}/address/{id}", ctx.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to delete address");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // No auto-promotion: zero defaults is a valid terminal state
    let addresses = list_addresses(&ctx, &token).await;
    assert_eq!(default_count(&addresses), 0);
}

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_foreign_address_id_behaves_like_missing() {
    let ctx = TestContext::new();
    let token = ctx.dealer_access_token().await;

    let resp = ctx
        .client
        .put(format!("{}/address/999999999", ctx.base_url))
        .bearer_auth(&token)
        .json(&json!({ "line1": "does not matter" }))
        .send()
        .await
        .expect("Failed to send update");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = ctx
        .client
        .delete(format!("{}/address/999999999", ctx.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send delete");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running accounts server"]
async fn test_create_with_missing_fields_reports_field_errors() {
    let ctx = TestContext::new();
    let token = ctx.dealer_access_token().await;

    let resp = ctx
        .client
        .post(format!("{}/address", ctx.base_url))
        .bearer_auth(&token)
        .json(&json!({ "line2": "only an optional field" }))
        .send()
        .await
        .expect("Failed to send create");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse response");
    for field in ["line1", "city", "state", "country", "postal_code"] {
        assert!(
            body["field_errors"][field].is_string(),
            "missing field error for {field}"
        );
    }
}
