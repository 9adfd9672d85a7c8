//! # Stock Movement Repository
//!
//! Read-side access to the append-only stock movement log.
//!
//! The log is the source of truth for refund accounting: remaining
//! refundable quantity is recomputed from it on every refund call, never
//! tracked in a mutable counter that could drift under retries. It also
//! feeds external inventory-audit tooling.

use sqlx::SqlitePool;

use crate::error::DbResult;
use colmado_core::StockMovement;

/// Columns selected for every movement read.
pub(crate) const MOVEMENT_COLUMNS: &str = "id, company_id, product_id, ref_type, ref_id, \
     qty_change, before_qty, after_qty, unit_cost_cents, note, created_by, created_at";

/// Repository for stock movement reads.
#[derive(Debug, Clone)]
pub struct StockMovementRepository {
    pool: SqlitePool,
}

impl StockMovementRepository {
    /// Creates a new StockMovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockMovementRepository { pool }
    }

    /// Lists movements for one product, newest first.
    pub async fn list_for_product(
        &self,
        company_id: &str,
        product_id: &str,
        limit: i64,
    ) -> DbResult<Vec<StockMovement>> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE company_id = ?1 AND product_id = ?2 \
             ORDER BY created_at DESC, id DESC LIMIT ?3"
        );
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(company_id)
            .bind(product_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }

    /// Lists movements attached to one sale or purchase order.
    pub async fn list_for_ref(&self, company_id: &str, ref_id: &str) -> DbResult<Vec<StockMovement>> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE company_id = ?1 AND ref_id = ?2 \
             ORDER BY created_at, id"
        );
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(company_id)
            .bind(ref_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }

    /// Sums all quantity deltas for a product since inception.
    ///
    /// For a product whose whole history lives in this log, the sum equals
    /// its current `stock_qty` exactly - the reconstruction invariant the
    /// audit tooling relies on.
    pub async fn sum_for_product(&self, company_id: &str, product_id: &str) -> DbResult<i64> {
        let sum: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(qty_change), 0) FROM stock_movements \
             WHERE company_id = ?1 AND product_id = ?2",
        )
        .bind(company_id)
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }
}
