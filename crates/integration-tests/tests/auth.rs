//! Auth flow tests: OTP request, verification, session cookie.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p medbasket-server)
//!
//! The OTP itself is read from the database rather than a phone, so the
//! SMS provider can be a stub in the test environment.

use medbasket_integration_tests::{base_url, client};
use reqwest::StatusCode;
use serde_json::{Value, json};

const TEST_PHONE: &str = "+919876500001";

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_protected_route_rejects_anonymous() {
    let resp = client()
        .get(format!("{}/auth/me", base_url()))
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_send_otp_accepts_valid_phone() {
    let resp = client()
        .post(format!("{}/auth/otp/send", base_url()))
        .json(&json!({ "phone": TEST_PHONE }))
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["success"], true);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_send_otp_rejects_garbage_phone() {
    let resp = client()
        .post(format!("{}/auth/otp/send", base_url()))
        .json(&json!({ "phone": "not-a-phone" }))
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert!(body["error"].is_string());
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_verify_wrong_code_rejected() {
    let http = client();

    let resp = http
        .post(format!("{}/auth/otp/send", base_url()))
        .json(&json!({ "phone": TEST_PHONE }))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = http
        .post(format!("{}/auth/otp/verify", base_url()))
        .json(&json!({ "phone": TEST_PHONE, "code": "000000" }))
        .send()
        .await
        .expect("Failed to reach server");

    // Either the code is wrong (400) or, astronomically rarely, correct
    assert!(
        resp.status() == StatusCode::BAD_REQUEST || resp.status() == StatusCode::OK,
        "unexpected status {}",
        resp.status()
    );
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_logout_clears_cookie() {
    let http = client();

    let resp = http
        .post(format!("{}/auth/logout", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = http
        .get(format!("{}/auth/me", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
