//! Catalog repository: categories, subcategories, products, variants,
//! and the medicine extension.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use medbasket_core::{
    CategoryId, CombinationId, MedicineId, ProductId, SubCategoryId, VariantTypeId, VariantValueId,
};

use super::RepositoryError;
use crate::models::{
    Category, CategoryTree, Medicine, Product, ProductDetail, ProductSummary, SubCategory,
    VariantCombination, VariantType, VariantValue,
};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug: row.slug,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubCategoryRow {
    id: i32,
    category_id: i32,
    name: String,
    slug: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<SubCategoryRow> for SubCategory {
    fn from(row: SubCategoryRow) -> Self {
        Self {
            id: SubCategoryId::new(row.id),
            category_id: CategoryId::new(row.category_id),
            name: row.name,
            slug: row.slug,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    subcategory_id: i32,
    name: String,
    slug: String,
    description: String,
    price: Decimal,
    mrp: Decimal,
    stock: i32,
    image_urls: Vec<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            subcategory_id: SubCategoryId::new(row.subcategory_id),
            name: row.name,
            slug: row.slug,
            description: row.description,
            price: row.price,
            mrp: row.mrp,
            stock: row.stock,
            image_urls: row.image_urls,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MedicineRow {
    id: i32,
    product_id: i32,
    composition: String,
    manufacturer: String,
    requires_prescription: bool,
}

impl From<MedicineRow> for Medicine {
    fn from(row: MedicineRow) -> Self {
        Self {
            id: MedicineId::new(row.id),
            product_id: ProductId::new(row.product_id),
            composition: row.composition,
            manufacturer: row.manufacturer,
            requires_prescription: row.requires_prescription,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CombinationRow {
    id: i32,
    product_id: i32,
    sku: String,
    price: Decimal,
    stock: i32,
    value_ids: Vec<i32>,
}

impl From<CombinationRow> for VariantCombination {
    fn from(row: CombinationRow) -> Self {
        Self {
            id: CombinationId::new(row.id),
            product_id: ProductId::new(row.product_id),
            sku: row.sku,
            price: row.price,
            stock: row.stock,
            value_ids: row.value_ids.into_iter().map(VariantValueId::new).collect(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    id: i32,
    name: String,
    slug: String,
    price: Decimal,
    mrp: Decimal,
    stock: i32,
    image_urls: Vec<String>,
}

impl From<SummaryRow> for ProductSummary {
    fn from(mut row: SummaryRow) -> Self {
        let image_url = if row.image_urls.is_empty() {
            None
        } else {
            Some(row.image_urls.remove(0))
        };
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            slug: row.slug,
            price: row.price,
            mrp: row.mrp,
            stock: row.stock,
            image_url,
        }
    }
}

// =============================================================================
// Input Types
// =============================================================================

/// Fields for creating or replacing a category or subcategory.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
}

/// Fields for the medicine extension of a product.
#[derive(Debug, Clone)]
pub struct NewMedicine {
    pub composition: String,
    pub manufacturer: String,
    pub requires_prescription: bool,
}

/// Fields for creating or replacing a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub subcategory_id: SubCategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub mrp: Decimal,
    pub stock: i32,
    pub image_urls: Vec<String>,
    pub is_active: bool,
    pub medicine: Option<NewMedicine>,
}

/// Fields for creating a variant combination.
#[derive(Debug, Clone)]
pub struct NewCombination {
    pub sku: String,
    pub price: Decimal,
    pub stock: i32,
    pub value_ids: Vec<VariantValueId>,
}

/// Product listing filter.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub subcategory_id: Option<SubCategoryId>,
    pub query: Option<String>,
    pub include_inactive: bool,
    pub limit: i64,
    pub offset: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// List all categories with their subcategories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_categories(&self) -> Result<Vec<CategoryTree>, RepositoryError> {
        let categories = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug, image_url, created_at
            FROM categories
            ORDER BY name ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let subcategories = sqlx::query_as::<_, SubCategoryRow>(
            r"
            SELECT id, category_id, name, slug, image_url, created_at
            FROM subcategories
            ORDER BY name ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let mut trees: Vec<CategoryTree> = categories
            .into_iter()
            .map(|row| CategoryTree {
                category: row.into(),
                subcategories: Vec::new(),
            })
            .collect();

        for sub in subcategories {
            let category_id = CategoryId::new(sub.category_id);
            if let Some(tree) = trees.iter_mut().find(|t| t.category.id == category_id) {
                tree.subcategories.push(sub.into());
            }
        }

        Ok(trees)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create_category(&self, new: &NewCategory) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO categories (name, slug, image_url)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, image_url, created_at
            ",
        )
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.image_url)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "category slug already exists"))?;

        Ok(row.into())
    }

    /// Replace a category's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn update_category(
        &self,
        id: CategoryId,
        new: &NewCategory,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE categories
            SET name = $2, slug = $3, image_url = $4
            WHERE id = $1
            RETURNING id, name, slug, image_url, created_at
            ",
        )
        .bind(id)
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.image_url)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "category slug already exists"))?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a category and (via cascade) its subcategories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Create a subcategory.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create_subcategory(
        &self,
        category_id: CategoryId,
        new: &NewCategory,
    ) -> Result<SubCategory, RepositoryError> {
        let row = sqlx::query_as::<_, SubCategoryRow>(
            r"
            INSERT INTO subcategories (category_id, name, slug, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, category_id, name, slug, image_url, created_at
            ",
        )
        .bind(category_id)
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.image_url)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "subcategory slug already exists"))?;

        Ok(row.into())
    }

    /// Replace a subcategory's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the subcategory doesn't exist.
    pub async fn update_subcategory(
        &self,
        id: SubCategoryId,
        new: &NewCategory,
    ) -> Result<SubCategory, RepositoryError> {
        let row = sqlx::query_as::<_, SubCategoryRow>(
            r"
            UPDATE subcategories
            SET name = $2, slug = $3, image_url = $4
            WHERE id = $1
            RETURNING id, category_id, name, slug, image_url, created_at
            ",
        )
        .bind(id)
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.image_url)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "subcategory slug already exists"))?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a subcategory.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_subcategory(&self, id: SubCategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM subcategories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List products matching a filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductSummary>, RepositoryError> {
        let limit = if filter.limit <= 0 { 50 } else { filter.limit };

        let rows = sqlx::query_as::<_, SummaryRow>(
            r"
            SELECT id, name, slug, price, mrp, stock, image_urls
            FROM products
            WHERE (is_active OR $1)
              AND ($2::int IS NULL OR subcategory_id = $2)
              AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%')
            ORDER BY name ASC
            LIMIT $4 OFFSET $5
            ",
        )
        .bind(filter.include_inactive)
        .bind(filter.subcategory_id)
        .bind(&filter.query)
        .bind(limit)
        .bind(filter.offset.max(0))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get full product detail: variants, combinations, medicine info.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_product_detail(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductDetail>, RepositoryError> {
        let product = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, subcategory_id, name, slug, description, price, mrp,
                   stock, image_urls, is_active, created_at, updated_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(product) = product else {
            return Ok(None);
        };

        let medicine = sqlx::query_as::<_, MedicineRow>(
            r"
            SELECT id, product_id, composition, manufacturer, requires_prescription
            FROM medicines
            WHERE product_id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let variant_types = self.variant_types(id).await?;
        let combinations = self.combinations(id).await?;

        Ok(Some(ProductDetail {
            product: product.into(),
            medicine: medicine.map(Into::into),
            variant_types,
            combinations,
        }))
    }

    /// Create a product, with its medicine extension if given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create_product(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products
                (subcategory_id, name, slug, description, price, mrp, stock, image_urls, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, subcategory_id, name, slug, description, price, mrp,
                      stock, image_urls, is_active, created_at, updated_at
            ",
        )
        .bind(new.subcategory_id)
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.description)
        .bind(new.price)
        .bind(new.mrp)
        .bind(new.stock)
        .bind(&new.image_urls)
        .bind(new.is_active)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "product slug already exists"))?;

        if let Some(medicine) = &new.medicine {
            sqlx::query(
                r"
                INSERT INTO medicines (product_id, composition, manufacturer, requires_prescription)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(row.id)
            .bind(&medicine.composition)
            .bind(&medicine.manufacturer)
            .bind(medicine.requires_prescription)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(row.into())
    }

    /// Replace a product's fields, upserting or removing the medicine
    /// extension to match the payload.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update_product(
        &self,
        id: ProductId,
        new: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE products
            SET subcategory_id = $2, name = $3, slug = $4, description = $5,
                price = $6, mrp = $7, stock = $8, image_urls = $9,
                is_active = $10, updated_at = now()
            WHERE id = $1
            RETURNING id, subcategory_id, name, slug, description, price, mrp,
                      stock, image_urls, is_active, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(new.subcategory_id)
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.description)
        .bind(new.price)
        .bind(new.mrp)
        .bind(new.stock)
        .bind(&new.image_urls)
        .bind(new.is_active)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "product slug already exists"))?;

        let Some(row) = row else {
            return Err(RepositoryError::NotFound);
        };

        if let Some(medicine) = &new.medicine {
            sqlx::query(
                r"
                INSERT INTO medicines (product_id, composition, manufacturer, requires_prescription)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (product_id) DO UPDATE
                SET composition = EXCLUDED.composition,
                    manufacturer = EXCLUDED.manufacturer,
                    requires_prescription = EXCLUDED.requires_prescription
                ",
            )
            .bind(id)
            .bind(&medicine.composition)
            .bind(&medicine.manufacturer)
            .bind(medicine.requires_prescription)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query("DELETE FROM medicines WHERE product_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(row.into())
    }

    /// Deactivate a product (it stays referenced by historical orders).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn deactivate_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products SET is_active = FALSE, updated_at = now()
            WHERE id = $1 AND is_active
            ",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Variants
    // =========================================================================

    /// Variant types for a product, with their values.
    async fn variant_types(&self, id: ProductId) -> Result<Vec<VariantType>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct TypeRow {
            id: i32,
            product_id: i32,
            name: String,
        }

        #[derive(sqlx::FromRow)]
        struct ValueRow {
            id: i32,
            variant_type_id: i32,
            value: String,
        }

        let types = sqlx::query_as::<_, TypeRow>(
            r"
            SELECT id, product_id, name
            FROM variant_types
            WHERE product_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let values = sqlx::query_as::<_, ValueRow>(
            r"
            SELECT vv.id, vv.variant_type_id, vv.value
            FROM variant_values vv
            JOIN variant_types vt ON vt.id = vv.variant_type_id
            WHERE vt.product_id = $1
            ORDER BY vv.id ASC
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let mut result: Vec<VariantType> = types
            .into_iter()
            .map(|t| VariantType {
                id: VariantTypeId::new(t.id),
                product_id: ProductId::new(t.product_id),
                name: t.name,
                values: Vec::new(),
            })
            .collect();

        for v in values {
            let type_id = VariantTypeId::new(v.variant_type_id);
            if let Some(t) = result.iter_mut().find(|t| t.id == type_id) {
                t.values.push(VariantValue {
                    id: VariantValueId::new(v.id),
                    variant_type_id: type_id,
                    value: v.value,
                });
            }
        }

        Ok(result)
    }

    /// Variant combinations for a product.
    async fn combinations(
        &self,
        id: ProductId,
    ) -> Result<Vec<VariantCombination>, RepositoryError> {
        let rows = sqlx::query_as::<_, CombinationRow>(
            r"
            SELECT vc.id, vc.product_id, vc.sku, vc.price, vc.stock,
                   COALESCE(
                       array_agg(cv.variant_value_id)
                           FILTER (WHERE cv.variant_value_id IS NOT NULL),
                       '{}'
                   ) AS value_ids
            FROM variant_combinations vc
            LEFT JOIN combination_values cv ON cv.combination_id = vc.id
            WHERE vc.product_id = $1
            GROUP BY vc.id
            ORDER BY vc.id ASC
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Add a variant type to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name already exists for
    /// this product.
    pub async fn create_variant_type(
        &self,
        product_id: ProductId,
        name: &str,
    ) -> Result<VariantType, RepositoryError> {
        let row: (i32,) = sqlx::query_as(
            r"
            INSERT INTO variant_types (product_id, name)
            VALUES ($1, $2)
            RETURNING id
            ",
        )
        .bind(product_id)
        .bind(name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "variant type already exists"))?;

        Ok(VariantType {
            id: VariantTypeId::new(row.0),
            product_id,
            name: name.to_owned(),
            values: Vec::new(),
        })
    }

    /// Delete a variant type (cascades to its values).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_variant_type(&self, id: VariantTypeId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM variant_types WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Add a value to a variant type.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the value already exists for
    /// this type.
    pub async fn create_variant_value(
        &self,
        variant_type_id: VariantTypeId,
        value: &str,
    ) -> Result<VariantValue, RepositoryError> {
        let row: (i32,) = sqlx::query_as(
            r"
            INSERT INTO variant_values (variant_type_id, value)
            VALUES ($1, $2)
            RETURNING id
            ",
        )
        .bind(variant_type_id)
        .bind(value)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "variant value already exists"))?;

        Ok(VariantValue {
            id: VariantValueId::new(row.0),
            variant_type_id,
            value: value.to_owned(),
        })
    }

    /// Delete a variant value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_variant_value(&self, id: VariantValueId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM variant_values WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Create a variant combination (a purchasable SKU).
    ///
    /// Validates that the given value IDs pick exactly one value for each of
    /// the product's variant types.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the value selection is wrong.
    /// Returns `RepositoryError::Conflict` if the SKU is taken.
    pub async fn create_combination(
        &self,
        product_id: ProductId,
        new: &NewCombination,
    ) -> Result<VariantCombination, RepositoryError> {
        // Map every value of this product to its variant type
        #[derive(sqlx::FromRow)]
        struct ValueTypeRow {
            value_id: i32,
            type_id: i32,
        }

        let value_types = sqlx::query_as::<_, ValueTypeRow>(
            r"
            SELECT vv.id AS value_id, vt.id AS type_id
            FROM variant_values vv
            JOIN variant_types vt ON vt.id = vv.variant_type_id
            WHERE vt.product_id = $1
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        let type_count = {
            let mut types: Vec<i32> = value_types.iter().map(|r| r.type_id).collect();
            types.sort_unstable();
            types.dedup();
            types.len()
        };

        let mut selected_types: Vec<i32> = Vec::with_capacity(new.value_ids.len());
        for value_id in &new.value_ids {
            let Some(row) = value_types.iter().find(|r| r.value_id == value_id.as_i32()) else {
                return Err(RepositoryError::Invalid(format!(
                    "variant value {value_id} does not belong to this product"
                )));
            };
            if selected_types.contains(&row.type_id) {
                return Err(RepositoryError::Invalid(
                    "combination selects multiple values for one variant type".to_owned(),
                ));
            }
            selected_types.push(row.type_id);
        }

        if selected_types.len() != type_count {
            return Err(RepositoryError::Invalid(
                "combination must select one value per variant type".to_owned(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let row: (i32,) = sqlx::query_as(
            r"
            INSERT INTO variant_combinations (product_id, sku, price, stock)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(product_id)
        .bind(&new.sku)
        .bind(new.price)
        .bind(new.stock)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "SKU already exists"))?;

        for value_id in &new.value_ids {
            sqlx::query(
                r"
                INSERT INTO combination_values (combination_id, variant_value_id)
                VALUES ($1, $2)
                ",
            )
            .bind(row.0)
            .bind(value_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(VariantCombination {
            id: CombinationId::new(row.0),
            product_id,
            sku: new.sku.clone(),
            price: new.price,
            stock: new.stock,
            value_ids: new.value_ids.clone(),
        })
    }

    /// Update a combination's price and stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the combination doesn't exist.
    pub async fn update_combination(
        &self,
        id: CombinationId,
        price: Decimal,
        stock: i32,
    ) -> Result<VariantCombination, RepositoryError> {
        let row = sqlx::query_as::<_, CombinationRow>(
            r"
            WITH updated AS (
                UPDATE variant_combinations
                SET price = $2, stock = $3
                WHERE id = $1
                RETURNING id, product_id, sku, price, stock
            )
            SELECT u.id, u.product_id, u.sku, u.price, u.stock,
                   COALESCE(
                       array_agg(cv.variant_value_id)
                           FILTER (WHERE cv.variant_value_id IS NOT NULL),
                       '{}'
                   ) AS value_ids
            FROM updated u
            LEFT JOIN combination_values cv ON cv.combination_id = u.id
            GROUP BY u.id, u.product_id, u.sku, u.price, u.stock
            ",
        )
        .bind(id)
        .bind(price)
        .bind(stock)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a combination.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_combination(&self, id: CombinationId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM variant_combinations WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
