//! Order repository: checkout, order history, per-item lifecycle, reports.
//!
//! Checkout is a single transaction: stock decrements use conditional
//! updates (`stock >= quantity` in the WHERE clause), coupon redemption goes
//! through the compare-and-swap in [`CouponRepository::redeem`], and item
//! names and prices are snapshotted so later catalog edits don't rewrite
//! history.
//!
//! Item status transitions likewise update conditionally on the expected
//! current status, so a cancel or return restores stock exactly once no
//! matter how many times the request is retried.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

use medbasket_core::{
    AddressId, CombinationId, CouponId, OrderId, OrderItemId, OrderItemStatus, OrderStatus,
    ProductId, UserId,
};

use super::RepositoryError;
use super::coupons::{CouponError, CouponRepository};
use crate::models::{Order, OrderDetail, OrderItem};

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// The shipping address doesn't exist or belongs to another user.
    #[error("address not found")]
    AddressNotFound,

    /// A cart line asks for more units than are on the shelf.
    #[error("insufficient stock for {0}")]
    InsufficientStock(String),

    /// The supplied coupon code can't be used on this order.
    #[error("coupon not applicable: {0}")]
    CouponNotApplicable(String),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Errors from moving an order item between statuses.
#[derive(Debug, Error)]
pub enum TransitionError {
    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The order or item doesn't exist (or belongs to another user).
    #[error("order item not found")]
    NotFound,

    /// The state machine has no such edge.
    #[error("cannot move item from {from} to {to}")]
    NotAllowed {
        from: OrderItemStatus,
        to: OrderItemStatus,
    },

    /// The edge exists but only an admin may take it.
    #[error("moving an item from {from} to {to} requires admin access")]
    RequiresAdmin {
        from: OrderItemStatus,
        to: OrderItemStatus,
    },
}

impl From<sqlx::Error> for TransitionError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    address_id: i32,
    coupon_id: Option<i32>,
    subtotal: Decimal,
    discount: Decimal,
    total: Decimal,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            address_id: AddressId::new(row.address_id),
            coupon_id: row.coupon_id.map(CouponId::new),
            subtotal: row.subtotal,
            discount: row.discount,
            total: row.total,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    combination_id: Option<i32>,
    name: String,
    unit_price: Decimal,
    quantity: i32,
    status: OrderItemStatus,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            combination_id: row.combination_id.map(CombinationId::new),
            name: row.name,
            unit_price: row.unit_price,
            quantity: row.quantity,
            status: row.status,
        }
    }
}

/// Cart line joined with current pricing, as read inside checkout.
#[derive(Debug, sqlx::FromRow)]
struct CheckoutLineRow {
    product_id: i32,
    combination_id: Option<i32>,
    quantity: i32,
    name: String,
    unit_price: Decimal,
}

const ORDER_COLUMNS: &str =
    "id, user_id, address_id, coupon_id, subtotal, discount, total, status, \
     created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, combination_id, name, unit_price, quantity, status";

/// One day of the revenue report.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RevenueDay {
    pub day: NaiveDate,
    pub orders: i64,
    pub revenue: Decimal,
}

/// Whole-range totals of the revenue report.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RevenueTotals {
    pub orders: i64,
    pub items_sold: i64,
    pub revenue: Decimal,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order from the user's cart.
    ///
    /// Runs in one transaction: validates the address, decrements stock per
    /// line, redeems the coupon if given, snapshots the lines into
    /// `order_items`, and clears the cart. Any failure rolls the whole thing
    /// back, stock included.
    ///
    /// # Errors
    ///
    /// Returns the [`CheckoutError`] explaining why the order wasn't placed.
    pub async fn checkout(
        &self,
        user_id: UserId,
        address_id: AddressId,
        coupon_code: Option<&str>,
    ) -> Result<OrderDetail, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let address_ok: Option<(i32,)> =
            sqlx::query_as("SELECT id FROM addresses WHERE id = $1 AND user_id = $2")
                .bind(address_id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
        if address_ok.is_none() {
            return Err(CheckoutError::AddressNotFound);
        }

        let lines = sqlx::query_as::<_, CheckoutLineRow>(
            r"
            SELECT ci.product_id, ci.combination_id, ci.quantity,
                   p.name,
                   COALESCE(vc.price, p.price) AS unit_price
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            LEFT JOIN variant_combinations vc ON vc.id = ci.combination_id
            WHERE ci.user_id = $1 AND p.is_active
            ORDER BY ci.created_at ASC
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        for line in &lines {
            let taken = take_stock(
                &mut tx,
                ProductId::new(line.product_id),
                line.combination_id.map(CombinationId::new),
                line.quantity,
            )
            .await?;
            if !taken {
                return Err(CheckoutError::InsufficientStock(line.name.clone()));
            }
        }

        let subtotal: Decimal = lines
            .iter()
            .map(|l| l.unit_price * Decimal::from(l.quantity))
            .sum();

        let (coupon_id, discount) = match coupon_code {
            Some(code) => {
                let (coupon, discount) =
                    CouponRepository::redeem(&mut tx, code, subtotal, Utc::now())
                        .await
                        .map_err(|e| match e {
                            CouponError::Repository(r) => CheckoutError::Repository(r),
                            other => CheckoutError::CouponNotApplicable(other.to_string()),
                        })?;
                (Some(coupon.id), discount)
            }
            None => (None, Decimal::ZERO),
        };

        let total = subtotal - discount;

        let order_row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO orders (user_id, address_id, coupon_id, subtotal, discount, total)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(address_id)
        .bind(coupon_id)
        .bind(subtotal)
        .bind(discount)
        .bind(total)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let item = sqlx::query_as::<_, OrderItemRow>(&format!(
                r"
                INSERT INTO order_items
                    (order_id, product_id, combination_id, name, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {ITEM_COLUMNS}
                "
            ))
            .bind(order_row.id)
            .bind(line.product_id)
            .bind(line.combination_id)
            .bind(&line.name)
            .bind(line.unit_price)
            .bind(line.quantity)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item.into());
        }

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(OrderDetail {
            order: order_row.into(),
            items,
        })
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List every order, newest first. Admin view.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get an order with its items.
    ///
    /// When `owner` is given, the order must belong to that user; admins pass
    /// `None` to see any order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(
        &self,
        order_id: OrderId,
        owner: Option<UserId>,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE id = $1 AND ($2::int IS NULL OR user_id = $2)
            "
        ))
        .bind(order_id)
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(OrderDetail {
            order: row.into(),
            items: items.into_iter().map(Into::into).collect(),
        }))
    }

    /// Move an order item to a new status.
    ///
    /// The item row is locked for the duration, the UPDATE is conditional on
    /// the status it was read at, and stock restoration happens in the same
    /// transaction. Retrying a cancel therefore cannot restore stock twice.
    ///
    /// # Errors
    ///
    /// Returns the [`TransitionError`] explaining why the move was rejected.
    pub async fn transition_item(
        &self,
        order_id: OrderId,
        item_id: OrderItemId,
        owner: Option<UserId>,
        to: OrderItemStatus,
        is_admin: bool,
    ) -> Result<OrderItem, TransitionError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderItemRow>(&format!(
            r"
            SELECT oi.{cols}
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE oi.id = $1 AND oi.order_id = $2
              AND ($3::int IS NULL OR o.user_id = $3)
            FOR UPDATE OF oi
            ",
            cols = ITEM_COLUMNS.replace(", ", ", oi."),
        ))
        .bind(item_id)
        .bind(order_id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(TransitionError::NotFound);
        };
        let from = row.status;

        if !from.can_transition_to(to) {
            return Err(TransitionError::NotAllowed { from, to });
        }
        if !is_admin && !from.customer_may_request(to) {
            return Err(TransitionError::RequiresAdmin { from, to });
        }

        let updated = sqlx::query_as::<_, OrderItemRow>(&format!(
            r"
            UPDATE order_items
            SET status = $3
            WHERE id = $1 AND status = $2
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(item_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            // Lost a race between the read and the update.
            return Err(TransitionError::NotAllowed { from, to });
        };

        if from.restores_stock(to) {
            restore_stock(
                &mut tx,
                ProductId::new(updated.product_id),
                updated.combination_id.map(CombinationId::new),
                updated.quantity,
            )
            .await?;
        }

        tx.commit().await?;

        Ok(updated.into())
    }

    /// Daily order count and revenue over `[from, to]`, paid orders only.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revenue_by_day(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RevenueDay>, RepositoryError> {
        let rows = sqlx::query_as::<_, RevenueDay>(
            r"
            SELECT created_at::date AS day,
                   COUNT(*) AS orders,
                   COALESCE(SUM(total), 0) AS revenue
            FROM orders
            WHERE status = 'PAID'
              AND created_at::date BETWEEN $1 AND $2
            GROUP BY day
            ORDER BY day
            ",
        )
        .bind(from)
        .bind(to)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Order count, units sold, and gross revenue over `[from, to]`, paid
    /// orders only.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revenue_totals(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<RevenueTotals, RepositoryError> {
        let totals = sqlx::query_as::<_, RevenueTotals>(
            r"
            WITH paid AS (
                SELECT id, total
                FROM orders
                WHERE status = 'PAID'
                  AND created_at::date BETWEEN $1 AND $2
            )
            SELECT (SELECT COUNT(*) FROM paid) AS orders,
                   (SELECT COALESCE(SUM(oi.quantity), 0)::bigint
                      FROM order_items oi
                      JOIN paid ON paid.id = oi.order_id) AS items_sold,
                   (SELECT COALESCE(SUM(total), 0) FROM paid) AS revenue
            ",
        )
        .bind(from)
        .bind(to)
        .fetch_one(self.pool)
        .await?;

        Ok(totals)
    }
}

/// Decrement stock on the SKU the line points at.
///
/// Returns `false` when the conditional update matched no row, meaning the
/// shelf doesn't hold `quantity` units.
async fn take_stock(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
    combination_id: Option<CombinationId>,
    quantity: i32,
) -> Result<bool, sqlx::Error> {
    let result = match combination_id {
        Some(combination_id) => {
            sqlx::query(
                r"
                UPDATE variant_combinations
                SET stock = stock - $2
                WHERE id = $1 AND stock >= $2
                ",
            )
            .bind(combination_id)
            .bind(quantity)
            .execute(&mut **tx)
            .await?
        }
        None => {
            sqlx::query(
                r"
                UPDATE products
                SET stock = stock - $2, updated_at = now()
                WHERE id = $1 AND stock >= $2
                ",
            )
            .bind(product_id)
            .bind(quantity)
            .execute(&mut **tx)
            .await?
        }
    };

    Ok(result.rows_affected() > 0)
}

/// Put a cancelled or returned item's quantity back on the shelf.
async fn restore_stock(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
    combination_id: Option<CombinationId>,
    quantity: i32,
) -> Result<(), sqlx::Error> {
    match combination_id {
        Some(combination_id) => {
            sqlx::query("UPDATE variant_combinations SET stock = stock + $2 WHERE id = $1")
                .bind(combination_id)
                .bind(quantity)
                .execute(&mut **tx)
                .await?;
        }
        None => {
            sqlx::query(
                "UPDATE products SET stock = stock + $2, updated_at = now() WHERE id = $1",
            )
            .bind(product_id)
            .bind(quantity)
            .execute(&mut **tx)
            .await?;
        }
    }

    Ok(())
}
