//! Domain models returned by the repositories and serialized to clients.

pub mod address;
pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod order;
pub mod payment;
pub mod user;

pub use address::Address;
pub use cart::{CartItem, CartLine, CartView};
pub use catalog::{
    Category, CategoryTree, Medicine, Product, ProductDetail, ProductSummary, SubCategory,
    VariantCombination, VariantType, VariantValue,
};
pub use coupon::Coupon;
pub use order::{Order, OrderDetail, OrderItem};
pub use payment::Payment;
pub use user::User;
