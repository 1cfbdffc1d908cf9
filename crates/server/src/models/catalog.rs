//! Catalog models: categories, products, variants, medicines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use medbasket_core::{
    CategoryId, CombinationId, MedicineId, ProductId, SubCategoryId, VariantTypeId, VariantValueId,
};

/// A top-level catalog category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A subcategory within a category.
#[derive(Debug, Clone, Serialize)]
pub struct SubCategory {
    pub id: SubCategoryId,
    pub category_id: CategoryId,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A category with its subcategories, as served by `GET /categories`.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTree {
    #[serde(flatten)]
    pub category: Category,
    pub subcategories: Vec<SubCategory>,
}

/// A sellable product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub subcategory_id: SubCategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Selling price.
    pub price: Decimal,
    /// Maximum retail price (strike-through price in the UI).
    pub mrp: Decimal,
    pub stock: i32,
    pub image_urls: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pharmacy-specific extension of a product (1:1).
#[derive(Debug, Clone, Serialize)]
pub struct Medicine {
    pub id: MedicineId,
    pub product_id: ProductId,
    pub composition: String,
    pub manufacturer: String,
    pub requires_prescription: bool,
}

/// A variant axis for a product, e.g. "Size" or "Flavour".
#[derive(Debug, Clone, Serialize)]
pub struct VariantType {
    pub id: VariantTypeId,
    pub product_id: ProductId,
    pub name: String,
    pub values: Vec<VariantValue>,
}

/// One selectable value of a variant type, e.g. "500mg".
#[derive(Debug, Clone, Serialize)]
pub struct VariantValue {
    pub id: VariantValueId,
    pub variant_type_id: VariantTypeId,
    pub value: String,
}

/// A purchasable SKU formed by one value per variant type, with its own
/// price and stock.
#[derive(Debug, Clone, Serialize)]
pub struct VariantCombination {
    pub id: CombinationId,
    pub product_id: ProductId,
    pub sku: String,
    pub price: Decimal,
    pub stock: i32,
    pub value_ids: Vec<VariantValueId>,
}

/// Full product detail as served by `GET /products/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub medicine: Option<Medicine>,
    pub variant_types: Vec<VariantType>,
    pub combinations: Vec<VariantCombination>,
}

/// Compact product row for listings and search results (also the cached
/// representation for `?q=` searches).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub mrp: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
}
