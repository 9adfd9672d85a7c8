//! # Sale Operations
//!
//! Draft creation, settlement, cancellation and refunds.
//!
//! ## Settlement Algorithm (pay_sale)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN IMMEDIATE  (write lock acquired up front)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Load sale, require status = draft                                  │
//! │  2. Aggregate outgoing qty per product                                 │
//! │  3. Read product rows in ascending id order                            │
//! │  4. Collect EVERY shortage → INSUFFICIENT_STOCK with the full list     │
//! │  5. Resolve RNC / issue NCF (fiscal sales, same transaction)           │
//! │  6. Resolve paid/change amounts                                        │
//! │  7. Decrement stock + one 'sale' movement per product                  │
//! │  8. Update sale → paid | credit                                        │
//! │  9. CREDIT: open the credit account                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT  (any failure above rolls back steps 5-9 together)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Oversell is ALWAYS blocked here, even for products whose
//! `allow_negative_stock` flag is set: that flag is advisory and only the
//! manual adjustment path honors it. The money-moving path does not.

use chrono::{Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::{
    apply_stock_change_tx, fetch_product_tx, fetch_sale_items_tx, fetch_sale_tx,
    generate_invoice_no, refunded_quantities_tx, CreateSaleRequest, PaySaleRequest, PosEngine,
    RefundSaleRequest,
};
use crate::error::{DbError, EngineResult};
use crate::repository::fiscal::issue_ncf;
use crate::repository::sale::SaleWithItems;
use colmado_core::totals::{
    aggregate_quantities, any_quantity_remaining, line_totals, refund_plan, sale_totals,
    settlement_amounts,
};
use colmado_core::{
    validation, ActorContext, CoreError, CreditStatus, InvoiceType, PaymentMethod, RefType,
    SaleStatus, StockShortage, TaxRate, DEFAULT_CREDIT_TERM_DAYS,
};

impl PosEngine {
    /// Creates a sale in DRAFT: a priced quote with no stock effect.
    ///
    /// All referenced products must exist for the company; otherwise the
    /// whole request fails with the full list of unknown ids. Line totals
    /// are computed here, exactly once, and never recomputed.
    pub async fn create_sale(
        &self,
        ctx: &ActorContext,
        req: CreateSaleRequest,
    ) -> EngineResult<SaleWithItems> {
        debug!(company_id = %ctx.company_id, items = req.items.len(), "create_sale");

        validation::validate_sale_lines(&req.items)?;
        validation::validate_discount_cents(req.discount_cents)?;
        if let Some(rnc) = &req.customer_rnc {
            validation::validate_rnc(rnc)?;
        }

        let rate = TaxRate::itbis();
        let totals = sale_totals(&req.items, req.discount_cents, rate);

        let mut tx = self.db().write_tx().await?;

        // Resolve every referenced product up front; report ALL unknown ids
        let requested = aggregate_quantities(
            req.items
                .iter()
                .map(|line| (line.product_id.as_str(), line.qty)),
        );
        let mut names = std::collections::BTreeMap::new();
        let mut missing = Vec::new();
        for product_id in requested.keys() {
            match fetch_product_tx(&mut tx, &ctx.company_id, product_id).await? {
                Some(product) => {
                    names.insert(product_id.clone(), product.name);
                }
                None => missing.push(product_id.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(CoreError::ProductsNotFound {
                product_ids: missing,
            }
            .into());
        }

        let sale_id = Uuid::new_v4().to_string();
        let invoice_no = generate_invoice_no();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, company_id, invoice_no, invoice_type, ncf, status,
                subtotal_cents, discount_cents, itbis_cents, total_cents,
                paid_cents, change_cents,
                customer_id, customer_name, customer_rnc, payment_method, notes,
                created_by, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, NULL, ?5,
                ?6, ?7, ?8, ?9,
                0, 0,
                ?10, ?11, ?12, NULL, ?13,
                ?14, ?15, ?15
            )
            "#,
        )
        .bind(&sale_id)
        .bind(&ctx.company_id)
        .bind(&invoice_no)
        .bind(req.invoice_type)
        .bind(SaleStatus::Draft)
        .bind(totals.subtotal_cents)
        .bind(totals.discount_cents)
        .bind(totals.itbis_cents)
        .bind(totals.total_cents)
        .bind(&req.customer_id)
        .bind(&req.customer_name)
        .bind(&req.customer_rnc)
        .bind(&req.notes)
        .bind(&ctx.user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for line in &req.items {
            let amounts = line_totals(line, rate);
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, name_snapshot, qty,
                    unit_price_cents, discount_cents, itbis_cents, line_total_cents,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale_id)
            .bind(&line.product_id)
            .bind(names.get(&line.product_id).cloned().unwrap_or_default())
            .bind(line.qty)
            .bind(line.unit_price_cents)
            .bind(line.discount_cents)
            .bind(amounts.itbis_cents)
            .bind(amounts.total_cents)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale_id,
            invoice_no = %invoice_no,
            total_cents = totals.total_cents,
            "Sale created (draft)"
        );

        self.fetch_sale_with_items(&ctx.company_id, &sale_id).await
    }

    /// Settles a draft sale: the point at which stock is committed.
    pub async fn pay_sale(
        &self,
        ctx: &ActorContext,
        sale_id: &str,
        req: PaySaleRequest,
    ) -> EngineResult<SaleWithItems> {
        debug!(sale_id = %sale_id, method = ?req.payment_method, "pay_sale");

        let mut tx = self.db().write_tx().await?;

        let sale = fetch_sale_tx(&mut tx, &ctx.company_id, sale_id).await?;
        if sale.status != SaleStatus::Draft {
            return Err(CoreError::SaleNotDraft {
                sale_id: sale.id,
                status: sale.status,
            }
            .into());
        }

        let items = fetch_sale_items_tx(&mut tx, sale_id).await?;
        let requested =
            aggregate_quantities(items.iter().map(|item| (item.product_id.as_str(), item.qty)));

        // Read every product under the write lock, in ascending id order,
        // and collect ALL shortages before failing
        let mut products = Vec::with_capacity(requested.len());
        let mut shortages = Vec::new();
        for (product_id, &qty) in &requested {
            let product = fetch_product_tx(&mut tx, &ctx.company_id, product_id)
                .await?
                .ok_or_else(|| DbError::not_found("Product", product_id))?;

            if product.stock_qty - qty < 0 {
                shortages.push(StockShortage {
                    product_id: product_id.clone(),
                    requested: qty,
                    available: product.stock_qty,
                });
            }
            products.push((product, qty));
        }
        if !shortages.is_empty() {
            return Err(CoreError::InsufficientStock { shortages }.into());
        }

        // Fiscal preconditions: RNC present, NCF issued (same transaction)
        let resolved_rnc = req.customer_rnc.clone().or_else(|| sale.customer_rnc.clone());
        let mut ncf = sale.ncf.clone();
        if sale.invoice_type == InvoiceType::Fiscal {
            let Some(rnc) = &resolved_rnc else {
                return Err(CoreError::RncRequired.into());
            };
            validation::validate_rnc(rnc)?;

            if ncf.is_none() {
                let Some(doc_type) = &req.ncf_doc_type else {
                    return Err(colmado_core::ValidationError::Required {
                        field: "ncf_doc_type".to_string(),
                    }
                    .into());
                };
                validation::validate_doc_type(doc_type)?;
                let issued = issue_ncf(&mut *tx, &ctx.company_id, doc_type).await?;
                ncf = Some(issued.ncf);
            }
        }

        let amounts = settlement_amounts(sale.total_cents, req.paid_cents, req.payment_method)?;

        for (product, qty) in &products {
            apply_stock_change_tx(
                &mut tx,
                ctx,
                product,
                -qty,
                RefType::Sale,
                Some(sale_id),
                product.cost_cents,
                None,
            )
            .await?;
        }

        let new_status = if req.payment_method == PaymentMethod::Credit {
            SaleStatus::Credit
        } else {
            SaleStatus::Paid
        };
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE sales
            SET status = ?1,
                payment_method = ?2,
                paid_cents = ?3,
                change_cents = ?4,
                ncf = ?5,
                customer_rnc = COALESCE(?6, customer_rnc),
                updated_at = ?7
            WHERE id = ?8
            "#,
        )
        .bind(new_status)
        .bind(req.payment_method)
        .bind(amounts.paid_cents)
        .bind(amounts.change_cents)
        .bind(&ncf)
        .bind(&resolved_rnc)
        .bind(now)
        .bind(sale_id)
        .execute(&mut *tx)
        .await?;

        if new_status == SaleStatus::Credit {
            let balance_cents = (sale.total_cents - amounts.paid_cents).max(0);
            let term_days = req.credit_term_days.unwrap_or(DEFAULT_CREDIT_TERM_DAYS);
            let due_date = now + Duration::days(term_days);
            let status = CreditStatus::for_new_account(amounts.paid_cents, balance_cents);

            sqlx::query(
                r#"
                INSERT INTO credit_accounts (
                    id, company_id, sale_id, customer_id, customer_name,
                    total_cents, paid_cents, balance_cents, due_date, status,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&ctx.company_id)
            .bind(sale_id)
            .bind(&sale.customer_id)
            .bind(&sale.customer_name)
            .bind(sale.total_cents)
            .bind(amounts.paid_cents)
            .bind(balance_cents)
            .bind(due_date)
            .bind(status)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale_id,
            status = ?new_status,
            paid_cents = amounts.paid_cents,
            change_cents = amounts.change_cents,
            ncf = ncf.as_deref().unwrap_or("-"),
            "Sale settled"
        );

        self.fetch_sale_with_items(&ctx.company_id, sale_id).await
    }

    /// Cancels a sale. Idempotent: cancelling a cancelled sale is a no-op.
    ///
    /// A settled sale gets its remaining (un-refunded) quantities restored
    /// with `cancel_restore` movements, and any credit account is deleted -
    /// cancellation is a rollback, not a write-off. A draft just flips
    /// status.
    pub async fn cancel_sale(&self, ctx: &ActorContext, sale_id: &str) -> EngineResult<SaleWithItems> {
        debug!(sale_id = %sale_id, "cancel_sale");

        let mut tx = self.db().write_tx().await?;

        let sale = fetch_sale_tx(&mut tx, &ctx.company_id, sale_id).await?;
        if sale.status == SaleStatus::Cancelled {
            drop(tx);
            return self.fetch_sale_with_items(&ctx.company_id, sale_id).await;
        }

        if sale.status.has_stock_effect() {
            let items = fetch_sale_items_tx(&mut tx, sale_id).await?;
            let sold =
                aggregate_quantities(items.iter().map(|item| (item.product_id.as_str(), item.qty)));
            let refunded = refunded_quantities_tx(&mut tx, sale_id).await?;

            for (product_id, &sold_qty) in &sold {
                let restore = sold_qty - refunded.get(product_id).copied().unwrap_or(0);
                if restore <= 0 {
                    continue;
                }
                let product = fetch_product_tx(&mut tx, &ctx.company_id, product_id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Product", product_id))?;
                apply_stock_change_tx(
                    &mut tx,
                    ctx,
                    &product,
                    restore,
                    RefType::CancelRestore,
                    Some(sale_id),
                    None,
                    None,
                )
                .await?;
            }

            sqlx::query("DELETE FROM credit_accounts WHERE sale_id = ?1")
                .bind(sale_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE sales SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(SaleStatus::Cancelled)
            .bind(Utc::now())
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(sale_id = %sale_id, previous = ?sale.status, "Sale cancelled");

        self.fetch_sale_with_items(&ctx.company_id, sale_id).await
    }

    /// Refunds a sale, fully or partially.
    ///
    /// Remaining refundable quantity is recomputed from the movement log on
    /// every call, so repeating a refund request never restores more than
    /// what was sold. Refunding an already-refunded sale is a no-op.
    pub async fn refund_sale(
        &self,
        ctx: &ActorContext,
        sale_id: &str,
        req: RefundSaleRequest,
    ) -> EngineResult<SaleWithItems> {
        debug!(sale_id = %sale_id, "refund_sale");

        let mut tx = self.db().write_tx().await?;

        let sale = fetch_sale_tx(&mut tx, &ctx.company_id, sale_id).await?;
        if sale.status == SaleStatus::Refunded {
            drop(tx);
            return self.fetch_sale_with_items(&ctx.company_id, sale_id).await;
        }
        if !sale.status.is_refundable() {
            return Err(CoreError::SaleNotRefundable {
                sale_id: sale.id,
                status: sale.status,
            }
            .into());
        }

        let items = fetch_sale_items_tx(&mut tx, sale_id).await?;
        let sold =
            aggregate_quantities(items.iter().map(|item| (item.product_id.as_str(), item.qty)));
        let refunded = refunded_quantities_tx(&mut tx, sale_id).await?;

        // An explicit empty list means the same as no list: refund the rest
        let requested = req.items.as_deref().filter(|items| !items.is_empty());
        let plan = refund_plan(&sold, &refunded, requested)?;

        for (product_id, &qty) in &plan {
            let product = fetch_product_tx(&mut tx, &ctx.company_id, product_id)
                .await?
                .ok_or_else(|| DbError::not_found("Product", product_id))?;
            apply_stock_change_tx(
                &mut tx,
                ctx,
                &product,
                qty,
                RefType::Refund,
                Some(sale_id),
                None,
                None,
            )
            .await?;
        }

        let new_status = if any_quantity_remaining(&sold, &refunded, &plan) {
            SaleStatus::PartialRefunded
        } else {
            SaleStatus::Refunded
        };

        sqlx::query("UPDATE sales SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(new_status)
            .bind(Utc::now())
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale_id,
            refunded_products = plan.len(),
            status = ?new_status,
            "Sale refunded"
        );

        self.fetch_sale_with_items(&ctx.company_id, sale_id).await
    }

    /// Fetches the committed sale + items through the read repository.
    async fn fetch_sale_with_items(
        &self,
        company_id: &str,
        sale_id: &str,
    ) -> EngineResult<SaleWithItems> {
        let sale = self
            .db()
            .sales()
            .get_with_items(company_id, sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;
        Ok(sale)
    }
}
