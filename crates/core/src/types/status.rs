//! Status and role enums with their allowed transitions.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an individual order item.
///
/// Forward fulfillment (`Pending -> Shipped -> Delivered`) is admin-driven.
/// Customers may only cancel a `Pending` item or return a `Delivered` one;
/// both transitions restore stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderItemStatus {
    #[default]
    Pending,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

impl OrderItemStatus {
    /// Whether a transition from `self` to `next` is allowed at all.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Delivered)
                | (Self::Delivered, Self::Returned)
        )
    }

    /// Whether the `self -> next` transition restores stock.
    ///
    /// Exactly the cancel and return edges put quantity back on the shelf.
    #[must_use]
    pub const fn restores_stock(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Cancelled) | (Self::Delivered, Self::Returned)
        )
    }

    /// Whether a customer (as opposed to an admin) may request this transition.
    #[must_use]
    pub const fn customer_may_request(self, next: Self) -> bool {
        self.restores_stock(next)
    }
}

impl std::fmt::Display for OrderItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Shipped => write!(f, "SHIPPED"),
            Self::Delivered => write!(f, "DELIVERED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Returned => write!(f, "RETURNED"),
        }
    }
}

impl std::str::FromStr for OrderItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            "RETURNED" => Ok(Self::Returned),
            _ => Err(format!("invalid order item status: {s}")),
        }
    }
}

/// Overall order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Created,
    Paid,
    Failed,
}

/// Payment lifecycle as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Created,
    Paid,
    Failed,
}

/// User role carried in the auth token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "text", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// How a coupon's discount is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "text", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Percentage of the order subtotal, optionally capped.
    Percent,
    /// Fixed amount off the subtotal.
    Fixed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_cancel_only_from_pending() {
        assert!(OrderItemStatus::Pending.can_transition_to(OrderItemStatus::Cancelled));
        assert!(!OrderItemStatus::Shipped.can_transition_to(OrderItemStatus::Cancelled));
        assert!(!OrderItemStatus::Delivered.can_transition_to(OrderItemStatus::Cancelled));
        assert!(!OrderItemStatus::Cancelled.can_transition_to(OrderItemStatus::Cancelled));
    }

    #[test]
    fn test_return_only_from_delivered() {
        assert!(OrderItemStatus::Delivered.can_transition_to(OrderItemStatus::Returned));
        assert!(!OrderItemStatus::Pending.can_transition_to(OrderItemStatus::Returned));
        assert!(!OrderItemStatus::Returned.can_transition_to(OrderItemStatus::Returned));
    }

    #[test]
    fn test_forward_path() {
        assert!(OrderItemStatus::Pending.can_transition_to(OrderItemStatus::Shipped));
        assert!(OrderItemStatus::Shipped.can_transition_to(OrderItemStatus::Delivered));
        assert!(!OrderItemStatus::Pending.can_transition_to(OrderItemStatus::Delivered));
        assert!(!OrderItemStatus::Delivered.can_transition_to(OrderItemStatus::Shipped));
    }

    #[test]
    fn test_stock_restoring_edges() {
        assert!(OrderItemStatus::Pending.restores_stock(OrderItemStatus::Cancelled));
        assert!(OrderItemStatus::Delivered.restores_stock(OrderItemStatus::Returned));
        assert!(!OrderItemStatus::Pending.restores_stock(OrderItemStatus::Shipped));
        assert!(!OrderItemStatus::Shipped.restores_stock(OrderItemStatus::Delivered));
    }

    #[test]
    fn test_customer_requests() {
        assert!(OrderItemStatus::Pending.customer_may_request(OrderItemStatus::Cancelled));
        assert!(!OrderItemStatus::Pending.customer_may_request(OrderItemStatus::Shipped));
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            OrderItemStatus::Pending,
            OrderItemStatus::Shipped,
            OrderItemStatus::Delivered,
            OrderItemStatus::Cancelled,
            OrderItemStatus::Returned,
        ] {
            let parsed = OrderItemStatus::from_str(&status.to_string()).expect("roundtrip");
            assert_eq!(parsed, status);
        }
        assert!(OrderItemStatus::from_str("LOST").is_err());
    }

    #[test]
    fn test_status_serde_screaming_snake() {
        let json = serde_json::to_string(&OrderItemStatus::Cancelled).expect("serialize");
        assert_eq!(json, "\"CANCELLED\"");
    }

    #[test]
    fn test_role_roundtrip() {
        assert_eq!(Role::from_str("admin"), Ok(Role::Admin));
        assert_eq!(Role::Customer.to_string(), "customer");
        assert!(Role::from_str("root").is_err());
    }
}
