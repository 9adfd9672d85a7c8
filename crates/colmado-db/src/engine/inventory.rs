//! # Manual Inventory Adjustment
//!
//! Direct, operator-initiated stock corrections with a mandatory audit note.
//!
//! Unlike settlement, this path DOES honor the product's
//! `allow_negative_stock` flag: an explicit operator action may take a
//! tolerant product below zero, an automated sale never may.

use tracing::{debug, info};

use crate::engine::{apply_stock_change_tx, fetch_product_tx, AdjustStockOutcome, AdjustStockRequest, PosEngine};
use crate::error::{DbError, EngineResult};
use colmado_core::{validation, ActorContext, CoreError, RefType};

impl PosEngine {
    /// Applies a signed quantity change to one product.
    ///
    /// The single product row is read and mutated under the write lock;
    /// the movement records the note and the acting user.
    pub async fn adjust_stock(
        &self,
        ctx: &ActorContext,
        req: AdjustStockRequest,
    ) -> EngineResult<AdjustStockOutcome> {
        debug!(product_id = %req.product_id, qty_change = req.qty_change, "adjust_stock");

        validation::validate_adjustment(req.qty_change, &req.note)?;

        let mut tx = self.db().write_tx().await?;

        let product = fetch_product_tx(&mut tx, &ctx.company_id, &req.product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &req.product_id))?;

        if product.stock_qty + req.qty_change < 0 && !product.allow_negative_stock {
            return Err(CoreError::StockWouldGoNegative {
                product_id: product.id,
                current: product.stock_qty,
                qty_change: req.qty_change,
            }
            .into());
        }

        let after = apply_stock_change_tx(
            &mut tx,
            ctx,
            &product,
            req.qty_change,
            RefType::Adjustment,
            None,
            None,
            Some(req.note.trim()),
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            product_id = %req.product_id,
            qty_change = req.qty_change,
            stock_qty = after,
            "Stock adjusted"
        );

        Ok(AdjustStockOutcome {
            product_id: req.product_id,
            qty_change: req.qty_change,
            stock_qty: after,
        })
    }
}
