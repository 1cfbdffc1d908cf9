//! Catalog read-path tests.
//!
//! These tests require:
//! - A running `PostgreSQL` database seeded via `medbasket-cli seed`
//! - The API server running (cargo run -p medbasket-server)

use medbasket_integration_tests::{base_url, client};
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_categories_are_public() {
    let resp = client()
        .get(format!("{}/categories", base_url()))
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["success"], true);
    assert!(body["categories"].is_array());
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_product_listing_and_detail() {
    let http = client();

    let resp = http
        .get(format!("{}/products", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to parse body");
    let products = body["products"].as_array().expect("products array");
    assert!(!products.is_empty(), "seeded catalog should not be empty");

    let id = products[0]["id"].as_i64().expect("product id");
    let resp = http
        .get(format!("{}/products/{id}", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);

    let detail: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(detail["product"]["id"].as_i64(), Some(id));
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_search_matches_seeded_product() {
    let resp = client()
        .get(format!("{}/products?q=dolo", base_url()))
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    let products = body["products"].as_array().expect("products array");
    assert!(
        products
            .iter()
            .any(|p| p["name"].as_str().is_some_and(|n| n.contains("Dolo"))),
        "search for 'dolo' should match the seeded product"
    );
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_catalog_writes_require_admin() {
    let resp = client()
        .post(format!("{}/categories", base_url()))
        .json(&serde_json::json!({ "name": "X", "slug": "x" }))
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_unknown_product_is_404() {
    let resp = client()
        .get(format!("{}/products/999999999", base_url()))
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
