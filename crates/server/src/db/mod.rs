//! Database operations for the Medbasket `PostgreSQL` database.
//!
//! # Tables
//!
//! - `users` / `otp_codes` - Phone-based accounts and pending OTPs
//! - `addresses` - User shipping addresses (single-default invariant)
//! - `categories` / `subcategories` - Catalog taxonomy
//! - `products` / `medicines` - Products and their pharmacy extension
//! - `variant_types` / `variant_values` / `variant_combinations` - SKUs
//! - `cart_items` - Per-user cart lines
//! - `coupons` - Discount codes with usage caps
//! - `orders` / `order_items` - Checkout results and per-item lifecycle
//! - `payments` - Hosted-checkout sessions
//!
//! Queries are runtime-checked `sqlx::query`/`query_as` against
//! `#[derive(sqlx::FromRow)]` row structs, converted into domain models via
//! `TryFrom` so invalid database contents surface as
//! [`RepositoryError::DataCorruption`] rather than panics.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p medbasket-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod addresses;
pub mod cart;
pub mod catalog;
pub mod coupons;
pub mod orders;
pub mod payments;
pub mod users;

pub use addresses::AddressRepository;
pub use cart::CartRepository;
pub use catalog::CatalogRepository;
pub use coupons::CouponRepository;
pub use orders::OrderRepository;
pub use payments::PaymentRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique phone or slug).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Input is well-formed but violates a data rule (e.g., a variant
    /// combination that doesn't pick one value per type).
    #[error("invalid input: {0}")]
    Invalid(String),
}

impl RepositoryError {
    /// Map a sqlx error, turning unique violations into [`Self::Conflict`].
    pub(crate) fn from_sqlx(e: sqlx::Error, conflict_message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict_message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
