//! Order models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use medbasket_core::{
    AddressId, CombinationId, CouponId, OrderId, OrderItemId, OrderItemStatus, OrderStatus,
    ProductId, UserId,
};

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub address_id: AddressId,
    pub coupon_id: Option<CouponId>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an order with its name and price snapshotted at checkout.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub combination_id: Option<CombinationId>,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub status: OrderItemStatus,
}

/// An order with its items, as served by `GET /orders/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
