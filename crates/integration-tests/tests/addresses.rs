//! Address book tests.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p medbasket-server)
//! - `MEDBASKET_TEST_OTP` set to the stubbed SMS provider's fixed code

use medbasket_integration_tests::{base_url, client};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

const TEST_PHONE: &str = "+919876500003";

async fn login(phone: &str) -> Client {
    let http = client();

    let resp = http
        .post(format!("{}/auth/otp/send", base_url()))
        .json(&json!({ "phone": phone }))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);

    let code = std::env::var("MEDBASKET_TEST_OTP")
        .expect("MEDBASKET_TEST_OTP must hold the stubbed provider's fixed code");

    let resp = http
        .post(format!("{}/auth/otp/verify", base_url()))
        .json(&json!({ "phone": phone, "code": code, "name": "Address Tester" }))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);

    http
}

fn address_body(label: &str, default: bool) -> Value {
    json!({
        "label": label,
        "line1": "12 MG Road",
        "city": "Bengaluru",
        "state": "Karnataka",
        "postal_code": "560001",
        "phone": TEST_PHONE,
        "is_default": default,
    })
}

#[tokio::test]
#[ignore = "Requires running API server, database, and stubbed OTP"]
async fn test_only_one_default_address_survives() {
    let http = login(TEST_PHONE).await;

    for (label, default) in [("Home", true), ("Work", true)] {
        let resp = http
            .post(format!("{}/addresses", base_url()))
            .json(&address_body(label, default))
            .send()
            .await
            .expect("Failed to reach server");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = http
        .get(format!("{}/addresses", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    let body: Value = resp.json().await.expect("Failed to parse body");
    let addresses = body["addresses"].as_array().expect("addresses array");

    let defaults = addresses
        .iter()
        .filter(|a| a["is_default"].as_bool() == Some(true))
        .count();
    assert_eq!(defaults, 1, "exactly one address may be the default");

    // The default sorts first and is the most recently flagged one
    assert_eq!(addresses[0]["label"].as_str(), Some("Work"));

    // Clean up so the test is repeatable
    for address in addresses {
        let id = address["id"].as_i64().expect("address id");
        let resp = http
            .delete(format!("{}/addresses/{id}", base_url()))
            .send()
            .await
            .expect("Failed to reach server");
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

#[tokio::test]
#[ignore = "Requires running API server, database, and stubbed OTP"]
async fn test_deleting_default_promotes_remaining() {
    let http = login(TEST_PHONE).await;

    let mut ids = Vec::new();
    for (label, default) in [("First", false), ("Second", true)] {
        let resp = http
            .post(format!("{}/addresses", base_url()))
            .json(&address_body(label, default))
            .send()
            .await
            .expect("Failed to reach server");
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("Failed to parse body");
        ids.push(body["address"]["id"].as_i64().expect("address id"));
    }

    let resp = http
        .delete(format!("{}/addresses/{}", base_url(), ids[1]))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = http
        .get(format!("{}/addresses", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    let body: Value = resp.json().await.expect("Failed to parse body");
    let remaining = body["addresses"].as_array().expect("addresses array");

    let survivor = remaining
        .iter()
        .find(|a| a["id"].as_i64() == Some(ids[0]))
        .expect("remaining address");
    assert_eq!(survivor["is_default"].as_bool(), Some(true));

    let resp = http
        .delete(format!("{}/addresses/{}", base_url(), ids[0]))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);
}
