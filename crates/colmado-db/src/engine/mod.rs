//! # POS Engine
//!
//! The transactional heart of Colmado POS: every state-changing operation
//! runs here, inside exactly one `BEGIN IMMEDIATE` transaction.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE DRAFT                                                       │
//! │     └── create_sale() → Sale { status: Draft }                         │
//! │         (priced quote: totals computed once, NO stock effect)          │
//! │                                                                         │
//! │  2. SETTLE                                                             │
//! │     └── pay_sale() → Paid | Credit                                     │
//! │         (stock check + decrement + movements + NCF + credit account,   │
//! │          all-or-nothing inside one write transaction)                  │
//! │                                                                         │
//! │  3. (OPTIONAL) REFUND                                                  │
//! │     └── refund_sale() → PartialRefunded | Refunded                     │
//! │         (restores quantities; movement log makes retries idempotent)   │
//! │                                                                         │
//! │  4. (OPTIONAL) CANCEL                                                  │
//! │     └── cancel_sale() → Cancelled                                      │
//! │         (restores remaining stock, deletes the credit account)         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking Discipline
//!
//! - The write lock is acquired when the transaction BEGINs, before any row
//!   is read for a decision (the oversell check reads under the lock)
//! - Product rows are read and mutated in ascending id order across every
//!   multi-product operation
//! - No network I/O happens while a transaction is open
//! - Any error rolls the whole transaction back (sqlx rolls back on drop)

mod inventory;
mod purchase;
mod sale;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::{DbError, EngineResult};
use crate::pool::Database;
use crate::repository::product::PRODUCT_COLUMNS;
use crate::repository::sale::{SALE_COLUMNS, SALE_ITEM_COLUMNS};
use colmado_core::totals::{LineInput, RefundItem};
use colmado_core::{ActorContext, InvoiceType, PaymentMethod, Product, RefType, Sale, SaleItem};

// =============================================================================
// Requests
// =============================================================================

/// Request to create a draft sale.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSaleRequest {
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    /// Customer fiscal id; can also be supplied later, at settlement.
    pub customer_rnc: Option<String>,
    #[serde(default)]
    pub invoice_type: InvoiceType,
    pub items: Vec<LineInput>,
    /// Header-level discount in cents.
    #[serde(default)]
    pub discount_cents: i64,
    pub notes: Option<String>,
}

/// Request to settle a draft sale.
#[derive(Debug, Clone, Deserialize)]
pub struct PaySaleRequest {
    pub payment_method: PaymentMethod,
    /// For CREDIT: the initial partial payment (may be 0).
    /// For everything else: must cover the total.
    #[serde(default)]
    pub paid_cents: i64,
    /// RNC supplied at settlement time, if the draft carries none.
    pub customer_rnc: Option<String>,
    /// Doc type to request an NCF from, for fiscal sales without one.
    pub ncf_doc_type: Option<String>,
    /// Credit term in days; defaults when settling on credit without one.
    pub credit_term_days: Option<i64>,
}

/// Request to refund a sale. No items = refund everything that remains.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefundSaleRequest {
    #[serde(default)]
    pub items: Option<Vec<RefundItem>>,
}

/// Request for a manual stock adjustment.
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustStockRequest {
    pub product_id: String,
    /// Signed delta; positive receives stock, negative removes it.
    pub qty_change: i64,
    /// Mandatory: adjustments are operator actions and must be explainable.
    pub note: String,
}

/// One committed line of a purchase order request.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseLineInput {
    pub product_id: String,
    pub qty: i64,
    pub unit_cost_cents: i64,
}

/// Request to create a purchase order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePurchaseRequest {
    pub supplier_name: String,
    pub items: Vec<PurchaseLineInput>,
}

/// Outcome of a manual adjustment: the movement applied and the new level.
#[derive(Debug, Clone, Serialize)]
pub struct AdjustStockOutcome {
    pub product_id: String,
    pub qty_change: i64,
    pub stock_qty: i64,
}

// =============================================================================
// Engine
// =============================================================================

/// The POS engine: settlement, cancellation, refunds, receiving, adjustment.
///
/// Cheap to clone; all state lives in the database. Correctness relies on
/// the store's transactions, not on application-level mutexes.
#[derive(Debug, Clone)]
pub struct PosEngine {
    db: Database,
}

impl PosEngine {
    /// Creates a new engine over a database handle.
    pub fn new(db: Database) -> Self {
        PosEngine { db }
    }

    pub(crate) fn db(&self) -> &Database {
        &self.db
    }
}

// =============================================================================
// Shared Transaction Helpers
// =============================================================================

/// Fetches a sale inside an open transaction; NotFound if absent.
pub(crate) async fn fetch_sale_tx(
    conn: &mut SqliteConnection,
    company_id: &str,
    sale_id: &str,
) -> EngineResult<Sale> {
    let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE company_id = ?1 AND id = ?2");
    let sale = sqlx::query_as::<_, Sale>(&sql)
        .bind(company_id)
        .bind(sale_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

    Ok(sale)
}

/// Fetches a sale's items inside an open transaction.
pub(crate) async fn fetch_sale_items_tx(
    conn: &mut SqliteConnection,
    sale_id: &str,
) -> EngineResult<Vec<SaleItem>> {
    let sql = format!(
        "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, id"
    );
    let items = sqlx::query_as::<_, SaleItem>(&sql)
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(items)
}

/// Fetches one product row inside an open write transaction.
///
/// Callers iterate product ids in ascending order, so reads (and the
/// updates that follow) always touch rows in a stable order.
pub(crate) async fn fetch_product_tx(
    conn: &mut SqliteConnection,
    company_id: &str,
    product_id: &str,
) -> EngineResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE company_id = ?1 AND id = ?2");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(company_id)
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

/// Applies a stock delta to a product and records the movement, inside an
/// open write transaction.
///
/// The before/after snapshot comes from the row as read under the write
/// lock, so the movement log always reconstructs `stock_qty` exactly.
/// Returns the new stock level.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn apply_stock_change_tx(
    conn: &mut SqliteConnection,
    ctx: &ActorContext,
    product: &Product,
    qty_change: i64,
    ref_type: RefType,
    ref_id: Option<&str>,
    unit_cost_cents: Option<i64>,
    note: Option<&str>,
) -> EngineResult<i64> {
    let now = Utc::now();
    let after = product.stock_qty + qty_change;

    sqlx::query("UPDATE products SET stock_qty = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(after)
        .bind(now)
        .bind(&product.id)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, company_id, product_id, ref_type, ref_id,
            qty_change, before_qty, after_qty, unit_cost_cents, note,
            created_by, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&ctx.company_id)
    .bind(&product.id)
    .bind(ref_type)
    .bind(ref_id)
    .bind(qty_change)
    .bind(product.stock_qty)
    .bind(after)
    .bind(unit_cost_cents)
    .bind(note)
    .bind(&ctx.user_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(after)
}

/// Sums prior refund movements for a sale, per product.
///
/// This - not a mutable "refunded_qty" counter - is what makes refund
/// retries safe: the append-only log is the source of truth.
pub(crate) async fn refunded_quantities_tx(
    conn: &mut SqliteConnection,
    sale_id: &str,
) -> EngineResult<std::collections::BTreeMap<String, i64>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT product_id, COALESCE(SUM(qty_change), 0) FROM stock_movements \
         WHERE ref_type = ?1 AND ref_id = ?2 GROUP BY product_id",
    )
    .bind(RefType::Refund)
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().collect())
}

/// Generates a human-facing invoice number: `INV-YYMMDD-HHMMSS-NNNN`.
///
/// Time-based and collision-tolerant; this is NOT the fiscal number.
pub(crate) fn generate_invoice_no() -> String {
    let now = Utc::now();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    format!("INV-{}-{:04}", now.format("%y%m%d-%H%M%S"), nanos % 10000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_no_shape() {
        let n = generate_invoice_no();
        assert!(n.starts_with("INV-"));
        // INV- + 6 date + dash + 6 time + dash + 4 sequence
        assert_eq!(n.len(), 4 + 6 + 1 + 6 + 1 + 4);
    }
}
