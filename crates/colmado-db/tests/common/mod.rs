//! Common test utilities for colmado-db integration tests.

use std::sync::Once;

use colmado_db::repository::product::new_product;
use colmado_db::repository::sale::SaleWithItems;
use colmado_db::{Database, DbConfig};
use colmado_core::totals::LineInput;
use colmado_core::{ActorContext, InvoiceType, Product};

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,colmado_db=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Spawns a temp-file database.
///
/// A FILE database (not :memory:) so multiple pool connections contend for
/// the real write lock; the TempDir must be kept alive by the caller.
pub async fn test_db() -> (Database, tempfile::TempDir) {
    init_tracing();

    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("colmado-test.db");
    let db = Database::new(DbConfig::new(path))
        .await
        .expect("create test database");

    (db, dir)
}

/// The actor every test operation runs as.
pub fn ctx() -> ActorContext {
    ActorContext::new("company-1", "user-1")
}

/// Seeds one product with the given price and stock level.
pub async fn seed_product(db: &Database, sku: &str, price_cents: i64, stock_qty: i64) -> Product {
    let product = new_product("company-1", sku, &format!("Producto {sku}"), price_cents, stock_qty);
    db.products().insert(&product).await.expect("insert product");
    product
}

/// Creates a draft sale over (product_id, qty, unit_price_cents) lines.
pub async fn draft_sale(db: &Database, lines: &[(&str, i64, i64)]) -> SaleWithItems {
    draft_sale_typed(db, lines, InvoiceType::Normal, None).await
}

/// Creates a draft sale with an explicit invoice type and optional RNC.
pub async fn draft_sale_typed(
    db: &Database,
    lines: &[(&str, i64, i64)],
    invoice_type: InvoiceType,
    customer_rnc: Option<&str>,
) -> SaleWithItems {
    let items = lines
        .iter()
        .map(|(product_id, qty, unit_price_cents)| LineInput {
            product_id: product_id.to_string(),
            qty: *qty,
            unit_price_cents: *unit_price_cents,
            discount_cents: 0,
        })
        .collect();

    db.engine()
        .create_sale(
            &ctx(),
            colmado_db::engine::CreateSaleRequest {
                customer_id: None,
                customer_name: None,
                customer_rnc: customer_rnc.map(|s| s.to_string()),
                invoice_type,
                items,
                discount_cents: 0,
                notes: None,
            },
        )
        .await
        .expect("create draft sale")
}

/// Current stock level for a product.
pub async fn stock_of(db: &Database, product_id: &str) -> i64 {
    db.products()
        .get_by_id("company-1", product_id)
        .await
        .expect("product query")
        .expect("product exists")
        .stock_qty
}
