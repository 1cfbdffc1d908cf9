//! HTTP route handlers for the Medbasket API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (database ping)
//!
//! # Auth (OTP endpoints are strictly rate limited)
//! POST /auth/otp/send              - Text an OTP to a phone number
//! POST /auth/otp/verify            - Verify OTP, set session cookie
//! POST /auth/logout                - Clear session cookie
//! GET  /auth/me                    - Current user profile
//!
//! # Addresses (auth)
//! GET    /addresses                - List addresses, default first
//! POST   /addresses                - Create address
//! PUT    /addresses/{id}           - Replace address
//! DELETE /addresses/{id}           - Delete address
//!
//! # Catalog
//! GET    /categories               - Category trees with subcategories
//! POST   /categories               - Create category (admin)
//! PUT    /categories/{id}          - Update category (admin)
//! DELETE /categories/{id}          - Delete category (admin)
//! POST   /categories/{id}/subcategories - Create subcategory (admin)
//! PUT    /subcategories/{id}       - Update subcategory (admin)
//! DELETE /subcategories/{id}       - Delete subcategory (admin)
//!
//! GET    /products                 - List/search products (?subcategory_id=&q=)
//! GET    /products/{id}            - Product detail with variants
//! POST   /products                 - Create product (admin)
//! PUT    /products/{id}            - Update product (admin)
//! DELETE /products/{id}            - Deactivate product (admin)
//! POST   /products/{id}/variant-types       - Add variant type (admin)
//! DELETE /variant-types/{id}                - Delete variant type (admin)
//! POST   /variant-types/{id}/values         - Add variant value (admin)
//! DELETE /variant-values/{id}               - Delete variant value (admin)
//! POST   /products/{id}/combinations        - Create SKU (admin)
//! PUT    /combinations/{id}                 - Update SKU price/stock (admin)
//! DELETE /combinations/{id}                 - Delete SKU (admin)
//!
//! # Cart (auth)
//! GET    /cart                     - Priced cart view
//! POST   /cart/items               - Add line (quantity accumulates)
//! PUT    /cart/items/{id}          - Set line quantity
//! DELETE /cart/items/{id}          - Remove line
//! DELETE /cart                     - Clear cart
//! GET    /cart/count               - Total quantity (badge)
//!
//! # Coupons
//! GET    /coupons                  - List coupons (admin)
//! POST   /coupons                  - Create coupon (admin)
//! PUT    /coupons/{id}             - Update coupon (admin)
//! DELETE /coupons/{id}             - Delete coupon (admin)
//! POST   /coupons/apply            - Preview a coupon against the cart (auth)
//!
//! # Orders (auth)
//! POST  /orders                    - Checkout the cart
//! GET   /orders                    - Order history (?all=true for admin)
//! GET   /orders/{id}               - Order detail with items
//! PATCH /orders/{order_id}/items/{item_id}/status - Move item status
//! POST  /orders/{id}/payments      - Start hosted checkout
//!
//! # Payments
//! GET  /payments/{id}              - Payment status (auth)
//! POST /payments/webhook           - Gateway settlement webhook (HMAC)
//!
//! # Uploads (admin)
//! POST   /uploads                  - Upload an image (multipart)
//! DELETE /uploads/{key}            - Delete an image
//!
//! # Places proxy (auth)
//! GET /places/autocomplete?q=      - Address autocomplete
//! GET /places/details?place_id=    - Place details
//!
//! # Reports (admin)
//! GET /admin/reports/revenue?from=&to= - Daily revenue over a date range
//! ```

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod coupons;
pub mod orders;
pub mod payments;
pub mod places;
pub mod products;
pub mod reports;
pub mod uploads;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router. OTP endpoints get the strict limiter.
pub fn auth_routes() -> Router<AppState> {
    let otp = Router::new()
        .route("/otp/send", post(auth::send_otp))
        .route("/otp/verify", post(auth::verify_otp))
        .layer(auth_rate_limiter());

    Router::new()
        .merge(otp)
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::index).post(addresses::create))
        .route(
            "/{id}",
            put(addresses::update).delete(addresses::delete_address),
        )
}

/// Create the catalog taxonomy routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::index).post(catalog::create_category))
        .route(
            "/{id}",
            put(catalog::update_category).delete(catalog::delete_category),
        )
        .route("/{id}/subcategories", post(catalog::create_subcategory))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::deactivate),
        )
        .route("/{id}/variant-types", post(products::create_variant_type))
        .route("/{id}/combinations", post(products::create_combination))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/count", get(cart::count))
}

/// Create the coupon routes router.
pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(coupons::index).post(coupons::create))
        .route(
            "/{id}",
            put(coupons::update).delete(coupons::delete_coupon),
        )
        .route("/apply", post(coupons::apply))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::checkout))
        .route("/{id}", get(orders::show))
        .route(
            "/{order_id}/items/{item_id}/status",
            patch(orders::transition_item),
        )
        .route("/{id}/payments", post(payments::create))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(payments::show))
        .route("/webhook", post(payments::webhook))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/addresses", address_routes())
        .nest("/categories", category_routes())
        .route(
            "/subcategories/{id}",
            put(catalog::update_subcategory).delete(catalog::delete_subcategory),
        )
        .nest("/products", product_routes())
        .route("/variant-types/{id}", delete(products::delete_variant_type))
        .route(
            "/variant-types/{id}/values",
            post(products::create_variant_value),
        )
        .route(
            "/variant-values/{id}",
            delete(products::delete_variant_value),
        )
        .route(
            "/combinations/{id}",
            put(products::update_combination).delete(products::delete_combination),
        )
        .nest("/cart", cart_routes())
        .nest("/coupons", coupon_routes())
        .nest("/orders", order_routes())
        .nest("/payments", payment_routes())
        .route(
            "/uploads",
            post(uploads::create),
        )
        .route("/uploads/{key}", delete(uploads::delete_upload))
        .route("/places/autocomplete", get(places::autocomplete))
        .route("/places/details", get(places::details))
        .route("/admin/reports/revenue", get(reports::revenue))
}
