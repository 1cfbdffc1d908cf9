//! User model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use medbasket_core::{PhoneNumber, Role, UserId};

/// A registered user, identified by phone number.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub phone: PhoneNumber,
    pub name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this user may access admin-only routes.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
