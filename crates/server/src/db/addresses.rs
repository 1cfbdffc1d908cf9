//! Address repository.
//!
//! Enforces the single-default invariant: at most one address per user has
//! `is_default = true`. Every write that touches the flag happens inside one
//! transaction, so concurrent writes cannot leave two defaults behind.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use medbasket_core::{AddressId, PhoneNumber, UserId};

use super::RepositoryError;
use crate::models::Address;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i32,
    user_id: i32,
    label: String,
    line1: String,
    line2: Option<String>,
    city: String,
    state: String,
    postal_code: String,
    phone: String,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AddressRow> for Address {
    type Error = RepositoryError;

    fn try_from(row: AddressRow) -> Result<Self, Self::Error> {
        let phone = PhoneNumber::parse(&row.phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
        })?;

        Ok(Self {
            id: AddressId::new(row.id),
            user_id: UserId::new(row.user_id),
            label: row.label,
            line1: row.line1,
            line2: row.line2,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code,
            phone,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Fields for creating or replacing an address.
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub label: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub phone: PhoneNumber,
    pub is_default: bool,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, user_id, label, line1, line2, city, state, postal_code,
                   phone, is_default, created_at, updated_at
            FROM addresses
            WHERE user_id = $1
            ORDER BY is_default DESC, created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get one of a user's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, user_id, label, line1, line2, city, state, postal_code,
                   phone, is_default, created_at, updated_at
            FROM addresses
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(address_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create an address.
    ///
    /// The user's first address always becomes the default. If
    /// `is_default = true`, the flag is cleared on all other addresses in the
    /// same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (existing,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM addresses WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;
        let is_default = address.is_default || existing == 0;

        if is_default {
            sqlx::query(
                r"
                UPDATE addresses SET is_default = FALSE, updated_at = now()
                WHERE user_id = $1 AND is_default
                ",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, AddressRow>(
            r"
            INSERT INTO addresses
                (user_id, label, line1, line2, city, state, postal_code, phone, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, label, line1, line2, city, state, postal_code,
                      phone, is_default, created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(&address.label)
        .bind(&address.line1)
        .bind(&address.line2)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.postal_code)
        .bind(&address.phone)
        .bind(is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }

    /// Replace an address's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address doesn't exist or
    /// belongs to another user.
    pub async fn update(
        &self,
        user_id: UserId,
        address_id: AddressId,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if address.is_default {
            sqlx::query(
                r"
                UPDATE addresses SET is_default = FALSE, updated_at = now()
                WHERE user_id = $1 AND is_default AND id <> $2
                ",
            )
            .bind(user_id)
            .bind(address_id)
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, AddressRow>(
            r"
            UPDATE addresses
            SET label = $3, line1 = $4, line2 = $5, city = $6, state = $7,
                postal_code = $8, phone = $9, is_default = $10, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, label, line1, line2, city, state, postal_code,
                      phone, is_default, created_at, updated_at
            ",
        )
        .bind(address_id)
        .bind(user_id)
        .bind(&address.label)
        .bind(&address.line1)
        .bind(&address.line2)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.postal_code)
        .bind(&address.phone)
        .bind(address.is_default)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(RepositoryError::NotFound);
        };

        tx.commit().await?;

        row.try_into()
    }

    /// Delete an address.
    ///
    /// If the deleted address was the default, the most recently created
    /// remaining address is promoted.
    ///
    /// # Returns
    ///
    /// Returns `true` if the address was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn delete(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let deleted: Option<(bool,)> = sqlx::query_as(
            r"
            DELETE FROM addresses
            WHERE id = $1 AND user_id = $2
            RETURNING is_default
            ",
        )
        .bind(address_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((was_default,)) = deleted else {
            return Ok(false);
        };

        if was_default {
            sqlx::query(
                r"
                UPDATE addresses SET is_default = TRUE, updated_at = now()
                WHERE id = (
                    SELECT id FROM addresses
                    WHERE user_id = $1
                    ORDER BY created_at DESC
                    LIMIT 1
                )
                ",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(true)
    }
}
