//! Payment repository.
//!
//! Rows mirror hosted-checkout sessions at the gateway. Status changes come
//! from the webhook handler, keyed by the gateway's own order id.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use medbasket_core::{OrderId, PaymentId, PaymentStatus};

use super::RepositoryError;
use crate::models::Payment;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i32,
    order_id: i32,
    provider_order_id: String,
    amount: Decimal,
    status: PaymentStatus,
    redirect_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: PaymentId::new(row.id),
            order_id: OrderId::new(row.order_id),
            provider_order_id: row.provider_order_id,
            amount: row.amount,
            status: row.status,
            redirect_url: row.redirect_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PAYMENT_COLUMNS: &str =
    "id, order_id, provider_order_id, amount, status, redirect_url, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for payment database operations.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a freshly created checkout session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        order_id: OrderId,
        provider_order_id: &str,
        amount: Decimal,
        redirect_url: &str,
    ) -> Result<Payment, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r"
            INSERT INTO payments (order_id, provider_order_id, amount, redirect_url)
            VALUES ($1, $2, $3, $4)
            RETURNING {PAYMENT_COLUMNS}
            "
        ))
        .bind(order_id)
        .bind(provider_order_id)
        .bind(amount)
        .bind(redirect_url)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get a payment by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, payment_id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(payment_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get a payment by the gateway's order id, as referenced by webhooks.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_provider_order_id(
        &self,
        provider_order_id: &str,
    ) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE provider_order_id = $1"
        ))
        .bind(provider_order_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Settle a payment and its order together.
    ///
    /// Only moves forward out of `CREATED`; a repeated webhook delivery for
    /// an already settled payment is a no-op returning the current row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no payment matches.
    pub async fn settle(
        &self,
        provider_order_id: &str,
        status: PaymentStatus,
    ) -> Result<Payment, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r"
            UPDATE payments
            SET status = $2, updated_at = now()
            WHERE provider_order_id = $1 AND status = 'CREATED'
            RETURNING {PAYMENT_COLUMNS}
            "
        ))
        .bind(provider_order_id)
        .bind(status)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            // Already settled or unknown; report current state if it exists.
            tx.rollback().await?;
            return self
                .get_by_provider_order_id(provider_order_id)
                .await?
                .ok_or(RepositoryError::NotFound);
        };

        sqlx::query(
            r"
            UPDATE orders
            SET status = $2, updated_at = now()
            WHERE id = $1 AND status = 'CREATED'
            ",
        )
        .bind(row.order_id)
        .bind(match row.status {
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Created => "CREATED",
        })
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }
}
