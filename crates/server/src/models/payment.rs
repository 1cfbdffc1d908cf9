//! Payment model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use medbasket_core::{OrderId, PaymentId, PaymentStatus};

/// A payment attempt against an order, backed by a hosted-checkout session
/// at the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    /// The gateway's identifier for this checkout session.
    pub provider_order_id: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    /// Hosted checkout page the client should redirect to.
    pub redirect_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
