//! Back-office HTTP flows against the admin router.

use axum::http::StatusCode;
use serde_json::json;
use shophub_core::order::{CustomerInfo, Order, OrderLineRequest, PlaceOrder, TransitionPolicy};
use shophub_integration_tests::{ADMIN_EMAIL, TestClient, TestContext};

async fn signed_in(ctx: &TestContext) -> TestClient {
    let mut client = ctx.admin_app();
    let response = client.login(ADMIN_EMAIL).await;
    assert_eq!(response.status, StatusCode::OK);
    client
}

async fn widget_order(ctx: &TestContext, quantity: i64) -> Order {
    let widget = ctx.widget().await;
    ctx.services
        .orders
        .place(
            None,
            PlaceOrder {
                customer: CustomerInfo {
                    customer_name: "Alice".to_owned(),
                    mobile: "555".to_owned(),
                    address: "1 Main St".to_owned(),
                },
                lines: vec![OrderLineRequest {
                    product_id: widget.key,
                    quantity,
                }],
                claimed_total: None,
            },
        )
        .await
        .expect("order placed")
}

#[tokio::test]
async fn test_requires_admin_session() {
    let ctx = TestContext::new().await;
    let mut client = ctx.admin_app();

    assert_eq!(client.get("/health").await.status, StatusCode::OK);
    assert_eq!(client.get("/orders").await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(client.get("/").await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_customer_credentials_are_refused() {
    let ctx = TestContext::new().await;
    ctx.customer("Carol", "carol@shophub.test").await;
    let mut client = ctx.admin_app();

    let response = client.login("carol@shophub.test").await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(client.get("/orders").await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let ctx = TestContext::new().await;
    let mut client = signed_in(&ctx).await;

    assert_eq!(client.get("/").await.status, StatusCode::OK);
    assert_eq!(
        client.post_empty("/auth/logout").await.status,
        StatusCode::NO_CONTENT
    );
    assert_eq!(client.get("/").await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_category_and_product_management() {
    let ctx = TestContext::new().await;
    let mut client = signed_in(&ctx).await;

    let created = client
        .post(
            "/categories",
            json!({ "category_id": "gadgets", "name": "Gadgets" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let category_key = created.body["key"].as_str().expect("category key").to_owned();

    let duplicate = client
        .post(
            "/categories",
            json!({ "category_id": "gadgets", "name": "Other Gadgets" }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let orphan = client
        .post(
            "/products",
            json!({
                "category_id": "nowhere",
                "name": "Lost",
                "cost_price": "1.00",
                "sell_price": "2.00",
            }),
        )
        .await;
    assert_eq!(orphan.status, StatusCode::BAD_REQUEST);

    let oversized = client
        .post(
            "/products",
            json!({
                "category_id": "gadgets",
                "name": "Gold Widget",
                "cost_price": "1.00",
                "sell_price": "79228162514264337593543950335",
            }),
        )
        .await;
    assert_eq!(oversized.status, StatusCode::BAD_REQUEST);
    assert_eq!(client.get("/products").await.body.as_array().map(Vec::len), Some(0));

    let product = client
        .post(
            "/products",
            json!({
                "category_id": "gadgets",
                "name": "Widget",
                "cost_price": "12.00",
                "sell_price": "19.99",
                "stock_qty": 50,
            }),
        )
        .await;
    assert_eq!(product.status, StatusCode::CREATED);
    let product_key = product.body["key"].as_str().expect("product key").to_owned();

    let renamed = client
        .post(
            &format!("/products/{product_key}"),
            json!({
                "category_id": "gadgets",
                "name": "Widget Pro",
                "cost_price": "12.00",
                "sell_price": "24.99",
            }),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.body["name"], "Widget Pro");

    let deleted = client
        .post_empty(&format!("/products/{product_key}/delete"))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["deleted"], true);

    // Soft-deleted rows stay visible to administrators.
    let listing = client.get("/products").await;
    assert_eq!(listing.body.as_array().map(Vec::len), Some(1));

    let purged = client
        .post_empty(&format!("/products/{product_key}/purge"))
        .await;
    assert_eq!(purged.status, StatusCode::NO_CONTENT);
    assert_eq!(
        client.get(&format!("/products/{product_key}")).await.status,
        StatusCode::NOT_FOUND
    );

    let category_deleted = client
        .post_empty(&format!("/categories/{category_key}/delete"))
        .await;
    assert_eq!(category_deleted.status, StatusCode::OK);
    let inactive = client.get("/categories?status=inactive").await;
    assert_eq!(inactive.body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_order_fulfillment_and_one_shot_invoice() {
    let ctx = TestContext::new().await;
    let order = widget_order(&ctx, 2).await;
    let mut client = signed_in(&ctx).await;

    let pending = client.get("/orders?status=pending").await;
    assert_eq!(pending.body.as_array().map(Vec::len), Some(1));

    let early = client
        .post_empty(&format!("/orders/{}/invoice", order.id()))
        .await;
    assert_eq!(early.status, StatusCode::BAD_REQUEST);

    let delivered = client
        .post(
            &format!("/orders/{}/status", order.id()),
            json!({ "status": "delivered" }),
        )
        .await;
    assert_eq!(delivered.status, StatusCode::OK);
    assert_eq!(delivered.body["status"], "delivered");

    assert_eq!(
        client.get("/orders?status=pending").await.body.as_array().map(Vec::len),
        Some(0)
    );
    assert_eq!(
        client.get("/orders?status=delivered").await.body.as_array().map(Vec::len),
        Some(1)
    );

    let generated = client
        .post_empty(&format!("/orders/{}/invoice", order.id()))
        .await;
    assert_eq!(generated.status, StatusCode::SEE_OTHER);
    assert_eq!(generated.location.as_deref(), Some("/invoice"));

    let invoice = client.get("/invoice").await;
    assert_eq!(invoice.status, StatusCode::OK);
    assert_eq!(invoice.body["total_amount"], "39.98");
    assert_eq!(invoice.body["reference"], order.id().short_reference());
    let text = invoice.body["text"].as_str().expect("rendered text");
    assert!(text.contains("Widget \u{d7} 2 = $39.98"));

    assert_eq!(client.get("/invoice").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_filter_and_status_validation() {
    let ctx = TestContext::new().await;
    let order = widget_order(&ctx, 1).await;
    let mut client = signed_in(&ctx).await;

    assert_eq!(
        client.get("/orders?status=shipped").await.status,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        client.get("/orders?status=all").await.body.as_array().map(Vec::len),
        Some(1)
    );

    let unknown = client
        .post(
            &format!("/orders/{}/status", order.id()),
            json!({ "status": "shipped" }),
        )
        .await;
    assert!(unknown.status.is_client_error());

    let missing = client
        .get("/orders/00000000-0000-4000-8000-000000000000")
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_strict_policy_conflict() {
    let ctx = TestContext::with_policy(TransitionPolicy::Strict).await;
    let order = widget_order(&ctx, 1).await;
    let mut client = signed_in(&ctx).await;

    let uri = format!("/orders/{}/status", order.id());
    assert_eq!(
        client.post(&uri, json!({ "status": "delivered" })).await.status,
        StatusCode::OK
    );
    assert_eq!(
        client.post(&uri, json!({ "status": "pending" })).await.status,
        StatusCode::CONFLICT
    );
}

#[tokio::test]
async fn test_dashboard_and_profit() {
    let ctx = TestContext::new().await;
    let order = widget_order(&ctx, 2).await;
    let mut client = signed_in(&ctx).await;

    let stats = client.get("/").await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["total_products"], 1);
    assert_eq!(stats.body["total_categories"], 1);
    assert_eq!(stats.body["total_orders"], 1);
    assert_eq!(stats.body["pending_orders"], 1);

    client
        .post(
            &format!("/orders/{}/status", order.id()),
            json!({ "status": "delivered" }),
        )
        .await;

    let profit = client.get("/analytics").await;
    assert_eq!(profit.body["delivered_orders"], 1);
    assert_eq!(profit.body["revenue"], "39.98");
    assert_eq!(profit.body["profit"], "15.98");
}
