//! Shared types for Medbasket.
//!
//! This crate holds the domain vocabulary used by the server and CLI:
//! type-safe entity IDs, the `PhoneNumber` parse type, currency codes, and
//! the status/role enums with their allowed transitions.
//!
//! # Features
//!
//! - `postgres` - Enables sqlx `Type`/`Encode`/`Decode` implementations so
//!   these types can be bound directly in queries.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::id::{
    AddressId, CartItemId, CategoryId, CombinationId, CouponId, MedicineId, OrderId, OrderItemId,
    PaymentId, ProductId, SubCategoryId, UserId, VariantTypeId, VariantValueId,
};
pub use types::phone::{PhoneError, PhoneNumber};
pub use types::price::CurrencyCode;
pub use types::status::{DiscountType, OrderItemStatus, OrderStatus, PaymentStatus, Role};
