//! HTTP API integration tests, driven through the router with `oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use colmado_db::repository::product::new_product;
use colmado_db::{Database, DbConfig};
use colmado_server::routes::build_router;
use colmado_server::AppState;

/// Spawns a router over a temp-file database.
async fn spawn_app() -> (Router, Database, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let db = Database::new(DbConfig::new(dir.path().join("api-test.db")))
        .await
        .expect("create test database");
    let app = build_router(AppState::new(db.clone()));
    (app, db, dir)
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Company-ID", "company-1")
        .header("X-User-ID", "user-1")
        .header("content-type", "application/json");

    match body {
        Some(value) => builder
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn seed_product(db: &Database, sku: &str, price_cents: i64, stock_qty: i64) -> String {
    let product = new_product("company-1", sku, sku, price_cents, stock_qty);
    db.products().insert(&product).await.unwrap();
    product.id
}

#[tokio::test]
async fn health_needs_no_auth() {
    let (app, _db, _dir) = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_identity_headers_are_rejected() {
    let (app, _db, _dir) = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/sales")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn sale_lifecycle_over_http() {
    let (app, db, _dir) = spawn_app().await;
    let product_id = seed_product(&db, "COLA-600", 10000, 10).await;

    // Draft
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/sales",
            Some(json!({
                "items": [{ "product_id": product_id, "qty": 2, "unit_price_cents": 10000 }]
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let sale = body_json(response).await;
    assert_eq!(sale["status"], "draft");
    assert_eq!(sale["total_cents"], 23600);
    let sale_id = sale["id"].as_str().unwrap().to_string();

    // Settle with cash
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/sales/{sale_id}/pay"),
            Some(json!({ "payment_method": "cash", "paid_cents": 30000 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let paid = body_json(response).await;
    assert_eq!(paid["status"], "paid");
    assert_eq!(paid["change_cents"], 6400);

    // Read back
    let response = app
        .clone()
        .oneshot(request("GET", &format!("/sales/{sale_id}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Full refund, then the second refund is a no-op
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(request("POST", &format!("/sales/{sale_id}/refund"), Some(json!({}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let refunded = body_json(response).await;
        assert_eq!(refunded["status"], "refunded");
    }
}

#[tokio::test]
async fn insufficient_stock_maps_to_conflict_with_details() {
    let (app, db, _dir) = spawn_app().await;
    let product_id = seed_product(&db, "LECHE-1L", 10000, 1).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/sales",
            Some(json!({
                "items": [{ "product_id": product_id, "qty": 2, "unit_price_cents": 10000 }]
            })),
        ))
        .await
        .unwrap();
    let sale_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/sales/{sale_id}/pay"),
            Some(json!({ "payment_method": "cash", "paid_cents": 30000 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");
    let shortages = body["details"]["shortages"].as_array().unwrap();
    assert_eq!(shortages.len(), 1);
    assert_eq!(shortages[0]["requested"], 2);
    assert_eq!(shortages[0]["available"], 1);
}

#[tokio::test]
async fn fiscal_endpoints_configure_and_issue() {
    let (app, _db, _dir) = spawn_app().await;

    // Unconfigured doc type is a 400
    let response = app
        .clone()
        .oneshot(request("POST", "/fiscal/next-ncf", Some(json!({ "doc_type": "B02" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "NCF_SEQUENCE_UNAVAILABLE");

    // Configure, then issue
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/fiscal/sequences",
            Some(json!({ "doc_type": "B02" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(request("POST", "/fiscal/next-ncf", Some(json!({ "doc_type": "B02" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let issued = body_json(response).await;
    assert_eq!(issued["ncf"], "B0200000001");
    assert_eq!(issued["current_number"], 1);
}

#[tokio::test]
async fn adjustment_conflict_maps_to_409() {
    let (app, db, _dir) = spawn_app().await;
    let product_id = seed_product(&db, "CLAVO", 200, 1).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/inventory/adjust",
            Some(json!({
                "product_id": product_id,
                "qty_change": -5,
                "note": "conteo fisico"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "STOCK_WOULD_GO_NEGATIVE");
}

#[tokio::test]
async fn credit_listing_reflects_credit_settlements() {
    let (app, db, _dir) = spawn_app().await;
    let product_id = seed_product(&db, "ACEITE", 80000, 5).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/sales",
            Some(json!({
                "items": [{ "product_id": product_id, "qty": 1, "unit_price_cents": 80000 }]
            })),
        ))
        .await
        .unwrap();
    let sale_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/sales/{sale_id}/pay"),
            Some(json!({ "payment_method": "credit", "paid_cents": 0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("GET", "/credit?status=open", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let accounts = body_json(response).await;
    assert_eq!(accounts.as_array().unwrap().len(), 1);
    assert_eq!(accounts[0]["sale_id"], sale_id);
}
