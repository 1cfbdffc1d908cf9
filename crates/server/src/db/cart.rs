//! Cart repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use medbasket_core::{CartItemId, CombinationId, ProductId, UserId};

use super::RepositoryError;
use crate::models::{CartItem, CartLine, CartView};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    user_id: i32,
    product_id: i32,
    combination_id: Option<i32>,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: CartItemId::new(row.id),
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            combination_id: row.combination_id.map(CombinationId::new),
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Cart row joined with the current product/combination price.
#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: i32,
    user_id: i32,
    product_id: i32,
    combination_id: Option<i32>,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    name: String,
    unit_price: Decimal,
    image_urls: Vec<String>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        let line_total = row.unit_price * Decimal::from(row.quantity);
        let image_url = row.image_urls.first().cloned();
        Self {
            item: CartItem {
                id: CartItemId::new(row.id),
                user_id: UserId::new(row.user_id),
                product_id: ProductId::new(row.product_id),
                combination_id: row.combination_id.map(CombinationId::new),
                quantity: row.quantity,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            name: row.name,
            unit_price: row.unit_price,
            line_total,
            image_url,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's cart, priced against current product/combination prices.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn view(&self, user_id: UserId) -> Result<CartView, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT ci.id, ci.user_id, ci.product_id, ci.combination_id,
                   ci.quantity, ci.created_at, ci.updated_at,
                   p.name,
                   COALESCE(vc.price, p.price) AS unit_price,
                   p.image_urls
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            LEFT JOIN variant_combinations vc ON vc.id = ci.combination_id
            WHERE ci.user_id = $1
            ORDER BY ci.created_at ASC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let lines: Vec<CartLine> = rows.into_iter().map(Into::into).collect();
        let subtotal = lines.iter().map(|l| l.line_total).sum();
        let item_count = lines.iter().map(|l| i64::from(l.item.quantity)).sum();

        Ok(CartView {
            lines,
            subtotal,
            item_count,
        })
    }

    /// Add a product (or SKU) to the cart; quantity accumulates on repeat adds.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product (or combination)
    /// doesn't exist or is inactive.
    pub async fn upsert_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        combination_id: Option<CombinationId>,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        // The referenced product must exist and be purchasable
        let exists: Option<(bool,)> = sqlx::query_as(
            r"
            SELECT p.is_active
            FROM products p
            WHERE p.id = $1
              AND ($2::int IS NULL OR EXISTS (
                  SELECT 1 FROM variant_combinations vc
                  WHERE vc.id = $2 AND vc.product_id = p.id
              ))
            ",
        )
        .bind(product_id)
        .bind(combination_id)
        .fetch_optional(self.pool)
        .await?;

        match exists {
            Some((true,)) => {}
            Some((false,)) | None => return Err(RepositoryError::NotFound),
        }

        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            INSERT INTO cart_items (user_id, product_id, combination_id, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, product_id, COALESCE(combination_id, 0))
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity,
                          updated_at = now()
            RETURNING id, user_id, product_id, combination_id, quantity,
                      created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(combination_id)
        .bind(quantity)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Set the quantity of a cart item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist or
    /// belongs to another user.
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            UPDATE cart_items
            SET quantity = $3, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, product_id, combination_id, quantity,
                      created_at, updated_at
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .bind(quantity)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Remove a cart item.
    ///
    /// # Returns
    ///
    /// Returns `true` if the item was removed, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM cart_items
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Empty the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Total quantity across all cart lines (for the badge).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let row: (Option<i64>,) = sqlx::query_as(
            r"
            SELECT SUM(quantity)::bigint FROM cart_items WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.0.unwrap_or(0))
    }
}
