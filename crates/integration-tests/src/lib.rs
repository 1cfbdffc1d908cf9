//! Integration tests for the Medbasket API.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and run migrations
//! docker compose up -d postgres
//! cargo run -p medbasket-cli -- migrate
//!
//! # Start the server
//! cargo run -p medbasket-server
//!
//! # Run the (ignored-by-default) integration tests
//! cargo test -p medbasket-integration-tests -- --ignored
//! ```
//!
//! Tests live in `tests/` and talk to a running server over HTTP, keeping
//! their session in a reqwest cookie store the same way the client apps
//! hold the `token` cookie. They are `#[ignore]`d so `cargo test` stays
//! green without a server.
//!
//! # Environment Variables
//!
//! - `MEDBASKET_TEST_BASE_URL` - API base URL (default `http://localhost:3000`)
//! - `MEDBASKET_DATABASE_URL` - used by tests that set up fixtures directly

/// Base URL of the API under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("MEDBASKET_TEST_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// HTTP client with a cookie store, so the session cookie set by
/// `/auth/otp/verify` sticks for subsequent requests.
///
/// # Panics
///
/// Panics if the client cannot be constructed (test-only code).
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}
