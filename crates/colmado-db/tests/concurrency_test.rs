//! Concurrent settlement tests: no oversell, ever.

mod common;

use common::{ctx, draft_sale, seed_product, stock_of, test_db};

use colmado_db::engine::PaySaleRequest;
use colmado_db::EngineError;
use colmado_core::{CoreError, PaymentMethod};

/// Four settlements of 2 units race over a stock of 5. The write lock
/// serializes them: the deducted total can never exceed what was in stock,
/// and every loser fails with INSUFFICIENT_STOCK (not a lock error).
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_settlements_never_oversell() {
    let (db, _dir) = test_db().await;
    let product = seed_product(&db, "POLLO-LB", 8500, 5).await;

    // Drafts are free: none of them touch stock yet
    let mut sale_ids = Vec::new();
    for _ in 0..4 {
        let draft = draft_sale(&db, &[(&product.id, 2, 8500)]).await;
        sale_ids.push(draft.sale.id);
    }

    let mut handles = Vec::new();
    for sale_id in sale_ids {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            db.engine()
                .pay_sale(
                    &ctx(),
                    &sale_id,
                    PaySaleRequest {
                        payment_method: PaymentMethod::Cash,
                        paid_cents: 100000,
                        customer_rnc: None,
                        ncf_doc_type: None,
                        credit_term_days: None,
                    },
                )
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(EngineError::Core(CoreError::InsufficientStock { shortages })) => {
                assert_eq!(shortages[0].product_id, product.id);
            }
            Err(other) => panic!("unexpected settlement failure: {other:?}"),
        }
    }

    // 5 in stock, 2 per sale: exactly two settlements can win
    assert_eq!(successes, 2);
    assert_eq!(stock_of(&db, &product.id).await, 5 - 2 * successes);

    // And the movement log agrees with the final stock level
    let delta_sum = db
        .stock_movements()
        .sum_for_product("company-1", &product.id)
        .await
        .unwrap();
    assert_eq!(5 + delta_sum, stock_of(&db, &product.id).await);
}
