//! # Purchase Operations
//!
//! Purchase order creation and receiving - the stock-increasing mirror of
//! settlement, sharing its locking discipline: one write transaction,
//! products touched in ascending id order, all-or-nothing.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::{
    apply_stock_change_tx, fetch_product_tx, CreatePurchaseRequest, PosEngine,
};
use crate::error::{DbError, EngineResult};
use crate::repository::purchase::{PurchaseWithItems, PURCHASE_COLUMNS};
use colmado_core::{
    validation, ActorContext, CoreError, PurchaseOrder, PurchaseOrderItem, PurchaseStatus, RefType,
    ValidationError,
};

impl PosEngine {
    /// Creates a purchase order with committed line items, status `pending`.
    pub async fn create_purchase(
        &self,
        ctx: &ActorContext,
        req: CreatePurchaseRequest,
    ) -> EngineResult<PurchaseWithItems> {
        debug!(company_id = %ctx.company_id, items = req.items.len(), "create_purchase");

        if req.supplier_name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "supplier_name".to_string(),
            }
            .into());
        }
        if req.items.is_empty() {
            return Err(ValidationError::BadCollectionSize {
                field: "items".to_string(),
                min: 1,
                max: colmado_core::MAX_SALE_ITEMS,
            }
            .into());
        }
        for line in &req.items {
            validation::validate_quantity(line.qty)?;
            validation::validate_price_cents(line.unit_cost_cents)?;
        }

        let mut tx = self.db().write_tx().await?;

        // Every referenced product must exist for the company
        let mut missing = Vec::new();
        let mut unique_ids: Vec<&str> = req.items.iter().map(|l| l.product_id.as_str()).collect();
        unique_ids.sort_unstable();
        unique_ids.dedup();
        for product_id in unique_ids {
            if fetch_product_tx(&mut tx, &ctx.company_id, product_id)
                .await?
                .is_none()
            {
                missing.push(product_id.to_string());
            }
        }
        if !missing.is_empty() {
            return Err(CoreError::ProductsNotFound {
                product_ids: missing,
            }
            .into());
        }

        let order_id = Uuid::new_v4().to_string();
        let total_cents: i64 = req
            .items
            .iter()
            .map(|line| line.qty * line.unit_cost_cents)
            .sum();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO purchase_orders (
                id, company_id, supplier_name, status, total_cents,
                received_at, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?7)
            "#,
        )
        .bind(&order_id)
        .bind(&ctx.company_id)
        .bind(req.supplier_name.trim())
        .bind(PurchaseStatus::Pending)
        .bind(total_cents)
        .bind(&ctx.user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for line in &req.items {
            sqlx::query(
                r#"
                INSERT INTO purchase_order_items (id, purchase_order_id, product_id, qty, unit_cost_cents)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order_id)
            .bind(&line.product_id)
            .bind(line.qty)
            .bind(line.unit_cost_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(purchase_id = %order_id, total_cents, "Purchase order created");

        self.fetch_purchase_with_items(&ctx.company_id, &order_id).await
    }

    /// Receives a pending purchase order exactly once.
    ///
    /// Increments stock by the received quantities, moves each product's
    /// cost basis to the latest received unit cost, and writes one
    /// `purchase_receipt` movement per product. Already-received or
    /// cancelled orders fail the status guard.
    pub async fn receive_purchase(
        &self,
        ctx: &ActorContext,
        purchase_id: &str,
    ) -> EngineResult<PurchaseWithItems> {
        debug!(purchase_id = %purchase_id, "receive_purchase");

        let mut tx = self.db().write_tx().await?;

        let sql =
            format!("SELECT {PURCHASE_COLUMNS} FROM purchase_orders WHERE company_id = ?1 AND id = ?2");
        let order = sqlx::query_as::<_, PurchaseOrder>(&sql)
            .bind(&ctx.company_id)
            .bind(purchase_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("PurchaseOrder", purchase_id))?;

        if order.status != PurchaseStatus::Pending {
            return Err(CoreError::PurchaseNotReceivable {
                purchase_id: order.id,
                status: order.status.as_str().to_string(),
            }
            .into());
        }

        let items: Vec<PurchaseOrderItem> = sqlx::query_as(
            "SELECT id, purchase_order_id, product_id, qty, unit_cost_cents \
             FROM purchase_order_items WHERE purchase_order_id = ?1 ORDER BY product_id, id",
        )
        .bind(purchase_id)
        .fetch_all(&mut *tx)
        .await?;

        // Aggregate per product: total received qty, latest unit cost wins
        let mut per_product: std::collections::BTreeMap<String, (i64, i64)> =
            std::collections::BTreeMap::new();
        for item in &items {
            let entry = per_product
                .entry(item.product_id.clone())
                .or_insert((0, item.unit_cost_cents));
            entry.0 += item.qty;
            entry.1 = item.unit_cost_cents;
        }

        for (product_id, &(qty, unit_cost_cents)) in &per_product {
            let product = fetch_product_tx(&mut tx, &ctx.company_id, product_id)
                .await?
                .ok_or_else(|| DbError::not_found("Product", product_id))?;

            apply_stock_change_tx(
                &mut tx,
                ctx,
                &product,
                qty,
                RefType::PurchaseReceipt,
                Some(purchase_id),
                Some(unit_cost_cents),
                None,
            )
            .await?;

            // Cost basis moves to the latest received cost
            sqlx::query("UPDATE products SET cost_cents = ?1 WHERE id = ?2")
                .bind(unit_cost_cents)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
        }

        let now = Utc::now();
        sqlx::query(
            "UPDATE purchase_orders SET status = ?1, received_at = ?2 WHERE id = ?3",
        )
        .bind(PurchaseStatus::Received)
        .bind(now)
        .bind(purchase_id)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            purchase_id = %purchase_id,
            products = per_product.len(),
            "Purchase order received"
        );

        self.fetch_purchase_with_items(&ctx.company_id, purchase_id).await
    }

    /// Fetches the committed order + lines through the read repository.
    async fn fetch_purchase_with_items(
        &self,
        company_id: &str,
        purchase_id: &str,
    ) -> EngineResult<PurchaseWithItems> {
        let order = self
            .db()
            .purchases()
            .get_with_items(company_id, purchase_id)
            .await?
            .ok_or_else(|| DbError::not_found("PurchaseOrder", purchase_id))?;
        Ok(order)
    }
}
