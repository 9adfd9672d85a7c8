//! # Product Repository
//!
//! Read-side database operations for products.
//!
//! The catalog module owns product CRUD; this engine reads products and
//! mutates ONLY their stock fields - and those mutations happen in the
//! engine, under a write transaction, never here.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use colmado_core::Product;

/// Columns selected for every product read, kept in one place.
pub(crate) const PRODUCT_COLUMNS: &str = "id, company_id, sku, name, price_cents, cost_cents, \
     stock_qty, min_stock, max_stock, allow_negative_stock, is_active, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by ID within a company.
    pub async fn get_by_id(&self, company_id: &str, id: &str) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE company_id = ?1 AND id = ?2"
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(company_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a product.
    ///
    /// Exists for catalog-side seeding and tests; the engine itself never
    /// creates products.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, company_id, sku, name, price_cents, cost_cents,
                stock_qty, min_stock, max_stock, allow_negative_stock,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&product.id)
        .bind(&product.company_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock_qty)
        .bind(product.min_stock)
        .bind(product.max_stock)
        .bind(product.allow_negative_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists active products for a company.
    pub async fn list_active(&self, company_id: &str, limit: i64) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE company_id = ?1 AND is_active = 1 \
             ORDER BY name LIMIT ?2"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(company_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Lists products at or below their reorder threshold.
    pub async fn list_low_stock(&self, company_id: &str) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE company_id = ?1 AND is_active = 1 AND stock_qty <= min_stock \
             ORDER BY stock_qty ASC"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }
}

/// Builds a Product value with fresh timestamps, for seeding and tests.
pub fn new_product(
    company_id: &str,
    sku: &str,
    name: &str,
    price_cents: i64,
    stock_qty: i64,
) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4().to_string(),
        company_id: company_id.to_string(),
        sku: sku.to_string(),
        name: name.to_string(),
        price_cents,
        cost_cents: None,
        stock_qty,
        min_stock: 0,
        max_stock: None,
        allow_negative_stock: false,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
