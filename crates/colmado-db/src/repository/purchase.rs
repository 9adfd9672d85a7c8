//! # Purchase Order Repository
//!
//! Read-side access to purchase orders and their committed lines.
//!
//! Creation and receiving are engine operations; receiving is the
//! stock-increasing mirror of settlement and shares its locking discipline.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::DbResult;
use colmado_core::{PurchaseOrder, PurchaseOrderItem};

/// A purchase order together with its committed lines.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseWithItems {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub items: Vec<PurchaseOrderItem>,
}

/// Columns selected for every purchase order read.
pub(crate) const PURCHASE_COLUMNS: &str = "id, company_id, supplier_name, status, total_cents, \
     received_at, created_by, created_at";

/// Columns selected for every purchase order item read.
pub(crate) const PURCHASE_ITEM_COLUMNS: &str =
    "id, purchase_order_id, product_id, qty, unit_cost_cents";

/// Repository for purchase order reads.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Gets a purchase order by ID within a company.
    pub async fn get_by_id(&self, company_id: &str, id: &str) -> DbResult<Option<PurchaseOrder>> {
        let sql = format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchase_orders WHERE company_id = ?1 AND id = ?2"
        );
        let order = sqlx::query_as::<_, PurchaseOrder>(&sql)
            .bind(company_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Gets all committed lines for a purchase order.
    pub async fn get_items(&self, purchase_order_id: &str) -> DbResult<Vec<PurchaseOrderItem>> {
        let sql = format!(
            "SELECT {PURCHASE_ITEM_COLUMNS} FROM purchase_order_items \
             WHERE purchase_order_id = ?1 ORDER BY product_id, id"
        );
        let items = sqlx::query_as::<_, PurchaseOrderItem>(&sql)
            .bind(purchase_order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Gets a purchase order together with its lines.
    pub async fn get_with_items(
        &self,
        company_id: &str,
        id: &str,
    ) -> DbResult<Option<PurchaseWithItems>> {
        let Some(order) = self.get_by_id(company_id, id).await? else {
            return Ok(None);
        };
        let items = self.get_items(&order.id).await?;
        Ok(Some(PurchaseWithItems { order, items }))
    }
}
