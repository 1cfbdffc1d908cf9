//! User and OTP repository.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use medbasket_core::{PhoneNumber, Role, UserId};

use super::RepositoryError;
use crate::models::User;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    phone: String,
    name: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let phone = PhoneNumber::parse(&row.phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
        })?;
        let role = Role::from_str(&row.role)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid role: {e}")))?;

        Ok(Self {
            id: UserId::new(row.id),
            phone,
            name: row.name,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A pending OTP challenge for a phone number.
///
/// Only the SHA-256 hash of the code is stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OtpCode {
    pub id: i32,
    pub phone: String,
    pub code_hash: String,
    pub attempts: i32,
    pub consumed: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user and OTP database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their phone number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, phone, name, role, created_at, updated_at
            FROM users
            WHERE phone = $1
            ",
        )
        .bind(phone)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, phone, name, role, created_at, updated_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a new user from a verified phone number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the phone already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        phone: &PhoneNumber,
        name: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (phone, name)
            VALUES ($1, $2)
            RETURNING id, phone, name, role, created_at, updated_at
            ",
        )
        .bind(phone)
        .bind(name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "phone number already registered"))?;

        row.try_into()
    }

    /// Set a user's role. Used by the CLI to promote admins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_role(&self, id: UserId, role: Role) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET role = $1, updated_at = now()
            WHERE id = $2
            ",
        )
        .bind(role.to_string())
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    // =========================================================================
    // OTP operations
    // =========================================================================

    /// Store a new OTP hash for a phone number, invalidating any pending one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_otp(
        &self,
        phone: &PhoneNumber,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Only one live OTP per phone at a time
        sqlx::query(
            r"
            UPDATE otp_codes
            SET consumed = TRUE
            WHERE phone = $1 AND NOT consumed
            ",
        )
        .bind(phone)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO otp_codes (phone, code_hash, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(phone)
        .bind(code_hash)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Fetch the latest unconsumed OTP for a phone number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest_otp(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<OtpCode>, RepositoryError> {
        let row = sqlx::query_as::<_, OtpCode>(
            r"
            SELECT id, phone, code_hash, attempts, consumed, expires_at, created_at
            FROM otp_codes
            WHERE phone = $1 AND NOT consumed
            ORDER BY created_at DESC
            LIMIT 1
            ",
        )
        .bind(phone)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Record a failed verification attempt and return the new attempt count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the OTP row doesn't exist.
    pub async fn record_otp_attempt(&self, otp_id: i32) -> Result<i32, RepositoryError> {
        let row: Option<(i32,)> = sqlx::query_as(
            r"
            UPDATE otp_codes
            SET attempts = attempts + 1
            WHERE id = $1
            RETURNING attempts
            ",
        )
        .bind(otp_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(|(attempts,)| attempts)
            .ok_or(RepositoryError::NotFound)
    }

    /// Mark an OTP as consumed after successful verification.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the OTP row doesn't exist or
    /// was already consumed (the code is single-use).
    pub async fn consume_otp(&self, otp_id: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE otp_codes
            SET consumed = TRUE
            WHERE id = $1 AND NOT consumed
            ",
        )
        .bind(otp_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
