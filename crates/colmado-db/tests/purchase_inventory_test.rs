//! Purchase receiving and manual adjustment integration tests.

mod common;

use common::{ctx, seed_product, stock_of, test_db};

use colmado_db::engine::{AdjustStockRequest, CreatePurchaseRequest, PurchaseLineInput};
use colmado_db::EngineError;
use colmado_core::{CoreError, PurchaseStatus, RefType};

fn purchase(lines: &[(&str, i64, i64)]) -> CreatePurchaseRequest {
    CreatePurchaseRequest {
        supplier_name: "Distribuidora del Este".to_string(),
        items: lines
            .iter()
            .map(|(product_id, qty, unit_cost_cents)| PurchaseLineInput {
                product_id: product_id.to_string(),
                qty: *qty,
                unit_cost_cents: *unit_cost_cents,
            })
            .collect(),
    }
}

/// Receiving increments stock, moves the cost basis to the received cost,
/// and writes purchase_receipt movements.
#[tokio::test]
async fn receiving_increments_stock_and_updates_cost() {
    let (db, _dir) = test_db().await;
    let product = seed_product(&db, "HARINA-50LB", 150000, 2).await;

    let order = db
        .engine()
        .create_purchase(&ctx(), purchase(&[(&product.id, 10, 120000)]))
        .await
        .unwrap();
    assert_eq!(order.order.status, PurchaseStatus::Pending);
    assert_eq!(order.order.total_cents, 1200000);
    // Creation alone does not move stock
    assert_eq!(stock_of(&db, &product.id).await, 2);

    let received = db
        .engine()
        .receive_purchase(&ctx(), &order.order.id)
        .await
        .unwrap();
    assert_eq!(received.order.status, PurchaseStatus::Received);
    assert!(received.order.received_at.is_some());
    assert_eq!(stock_of(&db, &product.id).await, 12);

    let updated = db
        .products()
        .get_by_id("company-1", &product.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.cost_cents, Some(120000));

    let movements = db
        .stock_movements()
        .list_for_ref("company-1", &order.order.id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].ref_type, RefType::PurchaseReceipt);
    assert_eq!(movements[0].qty_change, 10);
    assert_eq!(movements[0].unit_cost_cents, Some(120000));
}

/// Receiving the same order twice fails the status guard and does not
/// double-add stock.
#[tokio::test]
async fn double_receive_is_rejected() {
    let (db, _dir) = test_db().await;
    let product = seed_product(&db, "ESPAGUETI", 4500, 0).await;

    let order = db
        .engine()
        .create_purchase(&ctx(), purchase(&[(&product.id, 5, 3000)]))
        .await
        .unwrap();
    db.engine()
        .receive_purchase(&ctx(), &order.order.id)
        .await
        .unwrap();

    let err = db
        .engine()
        .receive_purchase(&ctx(), &order.order.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::PurchaseNotReceivable { .. })
    ));
    assert_eq!(stock_of(&db, &product.id).await, 5);
}

/// Purchase orders must reference existing products.
#[tokio::test]
async fn purchase_rejects_unknown_products() {
    let (db, _dir) = test_db().await;

    let err = db
        .engine()
        .create_purchase(&ctx(), purchase(&[("no-such-product", 1, 100)]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::ProductsNotFound { .. })
    ));
}

/// A negative adjustment below zero is rejected for a strict product...
#[tokio::test]
async fn adjustment_respects_negative_stock_guard() {
    let (db, _dir) = test_db().await;
    let product = seed_product(&db, "CLAVO-2IN", 200, 3).await;

    let err = db
        .engine()
        .adjust_stock(
            &ctx(),
            AdjustStockRequest {
                product_id: product.id.clone(),
                qty_change: -5,
                note: "conteo fisico".to_string(),
            },
        )
        .await
        .unwrap_err();

    match err {
        EngineError::Core(CoreError::StockWouldGoNegative {
            current, qty_change, ..
        }) => {
            assert_eq!(current, 3);
            assert_eq!(qty_change, -5);
        }
        other => panic!("expected StockWouldGoNegative, got {other:?}"),
    }
    assert_eq!(stock_of(&db, &product.id).await, 3);
}

/// ...but allowed when the product opts into negative stock. Unlike
/// settlement, the manual path honors the advisory flag.
#[tokio::test]
async fn adjustment_allows_negative_when_flag_set() {
    let (db, _dir) = test_db().await;
    let mut product =
        colmado_db::repository::product::new_product("company-1", "FUNDA-GRANDE", "FUNDA-GRANDE", 100, 3);
    product.allow_negative_stock = true;
    db.products().insert(&product).await.unwrap();

    let outcome = db
        .engine()
        .adjust_stock(
            &ctx(),
            AdjustStockRequest {
                product_id: product.id.clone(),
                qty_change: -5,
                note: "merma no registrada".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.stock_qty, -2);
    assert_eq!(stock_of(&db, &product.id).await, -2);
}

/// Adjustments demand a non-empty note for the audit trail.
#[tokio::test]
async fn adjustment_requires_note() {
    let (db, _dir) = test_db().await;
    let product = seed_product(&db, "ESCOBA", 3500, 5).await;

    let err = db
        .engine()
        .adjust_stock(
            &ctx(),
            AdjustStockRequest {
                product_id: product.id.clone(),
                qty_change: 1,
                note: "  ".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::Validation(_))
    ));
}

/// Movements across receive + adjust + sell flows sum to the stock delta.
#[tokio::test]
async fn mixed_flows_keep_reconstruction_invariant() {
    let (db, _dir) = test_db().await;
    let product = seed_product(&db, "BOTELLON", 5000, 0).await;

    let order = db
        .engine()
        .create_purchase(&ctx(), purchase(&[(&product.id, 20, 3500)]))
        .await
        .unwrap();
    db.engine()
        .receive_purchase(&ctx(), &order.order.id)
        .await
        .unwrap();

    db.engine()
        .adjust_stock(
            &ctx(),
            AdjustStockRequest {
                product_id: product.id.clone(),
                qty_change: -2,
                note: "botellones rotos".to_string(),
            },
        )
        .await
        .unwrap();

    let delta_sum = db
        .stock_movements()
        .sum_for_product("company-1", &product.id)
        .await
        .unwrap();
    assert_eq!(delta_sum, 18);
    assert_eq!(stock_of(&db, &product.id).await, 18);
}
