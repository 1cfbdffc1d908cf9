//! Database seeding command.
//!
//! Inserts a small sample catalog (categories, subcategories, products with
//! a medicine extension, one coupon) for local development. Idempotent:
//! rows are matched on their unique slugs/codes and skipped if present.

use rust_decimal::Decimal;
use sqlx::PgPool;

use super::CommandError;

struct SeedProduct {
    subcategory_slug: &'static str,
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    price: Decimal,
    mrp: Decimal,
    stock: i32,
    medicine: Option<(&'static str, &'static str, bool)>,
}

fn sample_products() -> Vec<SeedProduct> {
    vec![
        SeedProduct {
            subcategory_slug: "pain-relief",
            name: "Dolo 650 Tablet",
            slug: "dolo-650-tablet",
            description: "Paracetamol 650mg, strip of 15 tablets",
            price: Decimal::new(3180, 2),
            mrp: Decimal::new(3350, 2),
            stock: 200,
            medicine: Some(("Paracetamol 650mg", "Micro Labs Ltd", false)),
        },
        SeedProduct {
            subcategory_slug: "antibiotics",
            name: "Azithral 500 Tablet",
            slug: "azithral-500-tablet",
            description: "Azithromycin 500mg, strip of 5 tablets",
            price: Decimal::new(13250, 2),
            mrp: Decimal::new(13250, 2),
            stock: 80,
            medicine: Some(("Azithromycin 500mg", "Alembic Pharmaceuticals", true)),
        },
        SeedProduct {
            subcategory_slug: "skin-care",
            name: "Cetaphil Gentle Cleanser 125ml",
            slug: "cetaphil-gentle-cleanser-125ml",
            description: "Soap-free cleanser for sensitive skin",
            price: Decimal::new(36000, 2),
            mrp: Decimal::new(41000, 2),
            stock: 45,
            medicine: None,
        },
    ]
}

/// Seed the database with sample data.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or an insert
/// fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    let medicines_id = upsert_category(&pool, "Medicines", "medicines").await?;
    let personal_care_id = upsert_category(&pool, "Personal Care", "personal-care").await?;

    upsert_subcategory(&pool, medicines_id, "Pain Relief", "pain-relief").await?;
    upsert_subcategory(&pool, medicines_id, "Antibiotics", "antibiotics").await?;
    upsert_subcategory(&pool, personal_care_id, "Skin Care", "skin-care").await?;

    for product in sample_products() {
        seed_product(&pool, &product).await?;
    }

    sqlx::query(
        r"
        INSERT INTO coupons
            (code, discount_type, discount_value, max_discount, min_order_total,
             usage_limit, expires_at)
        VALUES ('WELCOME10', 'percent', 10, 100, 199, 1000, now() + interval '90 days')
        ON CONFLICT (code) DO NOTHING
        ",
    )
    .execute(&pool)
    .await?;

    tracing::info!("Seed complete");
    Ok(())
}

async fn upsert_category(pool: &PgPool, name: &str, slug: &str) -> Result<i32, CommandError> {
    let row: (i32,) = sqlx::query_as(
        r"
        INSERT INTO categories (name, slug)
        VALUES ($1, $2)
        ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        ",
    )
    .bind(name)
    .bind(slug)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

async fn upsert_subcategory(
    pool: &PgPool,
    category_id: i32,
    name: &str,
    slug: &str,
) -> Result<i32, CommandError> {
    let row: (i32,) = sqlx::query_as(
        r"
        INSERT INTO subcategories (category_id, name, slug)
        VALUES ($1, $2, $3)
        ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        ",
    )
    .bind(category_id)
    .bind(name)
    .bind(slug)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

async fn seed_product(pool: &PgPool, product: &SeedProduct) -> Result<(), CommandError> {
    let existing: Option<(i32,)> = sqlx::query_as("SELECT id FROM products WHERE slug = $1")
        .bind(product.slug)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let row: (i32,) = sqlx::query_as(
        r"
        INSERT INTO products
            (subcategory_id, name, slug, description, price, mrp, stock)
        SELECT s.id, $2, $3, $4, $5, $6, $7
        FROM subcategories s
        WHERE s.slug = $1
        RETURNING id
        ",
    )
    .bind(product.subcategory_slug)
    .bind(product.name)
    .bind(product.slug)
    .bind(product.description)
    .bind(product.price)
    .bind(product.mrp)
    .bind(product.stock)
    .fetch_one(pool)
    .await?;

    if let Some((composition, manufacturer, requires_prescription)) = product.medicine {
        sqlx::query(
            r"
            INSERT INTO medicines (product_id, composition, manufacturer, requires_prescription)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(row.0)
        .bind(composition)
        .bind(manufacturer)
        .bind(requires_prescription)
        .execute(pool)
        .await?;
    }

    tracing::info!("Seeded product {}", product.slug);
    Ok(())
}
