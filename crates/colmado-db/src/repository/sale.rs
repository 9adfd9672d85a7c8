//! # Sale Repository
//!
//! Read-side database operations for sales and sale items.
//!
//! All writes to sales happen in the engine under a write transaction; this
//! repository serves lookups and the reporting reads (`/reports/*`), which
//! are pure queries with no side effects.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::DbResult;
use colmado_core::{Sale, SaleItem, SaleStatus};

/// Columns selected for every sale read.
pub(crate) const SALE_COLUMNS: &str = "id, company_id, invoice_no, invoice_type, ncf, status, \
     subtotal_cents, discount_cents, itbis_cents, total_cents, paid_cents, change_cents, \
     customer_id, customer_name, customer_rnc, payment_method, notes, created_by, \
     created_at, updated_at";

/// Columns selected for every sale item read.
pub(crate) const SALE_ITEM_COLUMNS: &str = "id, sale_id, product_id, name_snapshot, qty, \
     unit_price_cents, discount_cents, itbis_cents, line_total_cents, created_at";

/// A sale header together with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// One row of the sales summary report.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SalesSummaryRow {
    pub status: SaleStatus,
    pub sale_count: i64,
    pub subtotal_cents: i64,
    pub itbis_cents: i64,
    pub total_cents: i64,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID within a company.
    pub async fn get_by_id(&self, company_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE company_id = ?1 AND id = ?2");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(company_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets all items for a sale.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let sql = format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, id"
        );
        let items = sqlx::query_as::<_, SaleItem>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Gets a sale together with its items.
    pub async fn get_with_items(
        &self,
        company_id: &str,
        id: &str,
    ) -> DbResult<Option<SaleWithItems>> {
        let Some(sale) = self.get_by_id(company_id, id).await? else {
            return Ok(None);
        };
        let items = self.get_items(&sale.id).await?;
        Ok(Some(SaleWithItems { sale, items }))
    }

    /// Sales summary grouped by status over a created_at range (inclusive
    /// bounds, RFC 3339 strings). Pure read; no side effects.
    pub async fn sales_summary(
        &self,
        company_id: &str,
        from: Option<&str>,
        to: Option<&str>,
    ) -> DbResult<Vec<SalesSummaryRow>> {
        let rows = sqlx::query_as::<_, SalesSummaryRow>(
            r#"
            SELECT
                status,
                COUNT(*)                     AS sale_count,
                COALESCE(SUM(subtotal_cents), 0) AS subtotal_cents,
                COALESCE(SUM(itbis_cents), 0)    AS itbis_cents,
                COALESCE(SUM(total_cents), 0)    AS total_cents
            FROM sales
            WHERE company_id = ?1
              AND (?2 IS NULL OR created_at >= ?2)
              AND (?3 IS NULL OR created_at <= ?3)
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(company_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
