//! Address model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use medbasket_core::{AddressId, PhoneNumber, UserId};

/// A shipping address belonging to a user.
///
/// At most one address per user has `is_default = true`; the repository
/// enforces this transactionally.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    /// Display label, e.g. "Home" or "Office".
    pub label: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    /// Contact number for delivery, not necessarily the account phone.
    pub phone: PhoneNumber,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
