//! End-to-end tests for the storefront cart API.
//!
//! Each test drives the router in-process with a cookie-carrying client over
//! an in-memory session store.

use axum::http::StatusCode;
use nexus_integration_tests::TestClient;
use serde_json::{Value, json};

fn quantity_of(cart: &Value, product_id: &str) -> u64 {
    cart["items"]
        .as_array()
        .and_then(|items| items.iter().find(|item| item["product_id"] == product_id))
        .and_then(|item| item["quantity"].as_u64())
        .unwrap_or(0)
}

// =============================================================================
// Basics
// =============================================================================

#[tokio::test]
async fn test_health() {
    let mut client = TestClient::new();
    let (status, body) = client.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));
}

#[tokio::test]
async fn test_new_visitor_has_empty_cart() {
    let mut client = TestClient::new();
    let (status, cart) = client.get("/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"], json!([]));
    assert_eq!(cart["item_count"], 0);
    assert_eq!(cart["summary"]["total"], "0.00");

    let (_, count) = client.get("/cart/count").await;
    assert_eq!(count, json!({ "count": 0 }));
}

// =============================================================================
// Add / Update / Remove
// =============================================================================

#[tokio::test]
async fn test_add_accumulates_and_totals() {
    let mut client = TestClient::new();

    client.post("/cart/add", json!({ "product_id": "case" })).await;
    client.post("/cart/add", json!({ "product_id": "case" })).await;
    let (status, cart) = client
        .post("/cart/add", json!({ "product_id": "cable", "quantity": 1 }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(quantity_of(&cart, "case"), 2);
    assert_eq!(quantity_of(&cart, "cable"), 1);
    assert_eq!(cart["item_count"], 3);
    assert_eq!(cart["revision"], 3);
    assert_eq!(cart["summary"]["subtotal"], "24.97");
    assert_eq!(cart["summary"]["shipping"], "25.00");
    assert_eq!(cart["summary"]["tax"], "1.25");
    assert_eq!(cart["summary"]["total"], "51.22");

    let (_, count) = client.get("/cart/count").await;
    assert_eq!(count["count"], 3);
}

#[tokio::test]
async fn test_add_rejects_unknown_out_of_stock_and_over_limit() {
    let mut client = TestClient::new();

    let (status, _) = client.post("/cart/add", json!({ "product_id": "nope" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = client.post("/cart/add", json!({ "product_id": "tool" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = client
        .post("/cart/add", json!({ "product_id": "screen", "quantity": 0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    client
        .post("/cart/add", json!({ "product_id": "screen", "quantity": 3 }))
        .await;
    let (status, body) = client
        .post("/cart/add", json!({ "product_id": "screen" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("at most 3"));

    let (_, cart) = client.get("/cart").await;
    assert_eq!(quantity_of(&cart, "screen"), 3);
}

#[tokio::test]
async fn test_update_and_remove() {
    let mut client = TestClient::new();
    client
        .post("/cart/add", json!({ "product_id": "case", "quantity": 2 }))
        .await;
    client.post("/cart/add", json!({ "product_id": "cable" })).await;

    let (status, cart) = client
        .post("/cart/update", json!({ "product_id": "case", "quantity": 5 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quantity_of(&cart, "case"), 5);

    let (status, body) = client
        .post("/cart/update", json!({ "product_id": "case", "quantity": -1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, cart) = client
        .post("/cart/update", json!({ "product_id": "case", "quantity": 0 }))
        .await;
    assert_eq!(quantity_of(&cart, "case"), 0);
    assert_eq!(cart["item_count"], 1);

    let (_, cart) = client
        .post("/cart/remove", json!({ "product_id": "cable" }))
        .await;
    assert_eq!(cart["item_count"], 0);
}

#[tokio::test]
async fn test_removing_absent_product_changes_nothing() {
    let mut client = TestClient::new();
    let (_, before) = client.post("/cart/add", json!({ "product_id": "case" })).await;

    let (status, after) = client
        .post("/cart/remove", json!({ "product_id": "cable" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["revision"], before["revision"]);
    assert_eq!(after["item_count"], 1);
}

#[tokio::test]
async fn test_clear() {
    let mut client = TestClient::new();
    client
        .post("/cart/add", json!({ "product_id": "case", "quantity": 2 }))
        .await;

    let (status, cart) = client.post("/cart/clear", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"], json!([]));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_stale_revision_is_rejected() {
    let mut client = TestClient::new();
    let (_, cart) = client.post("/cart/add", json!({ "product_id": "case" })).await;
    let seen = cart["revision"].as_u64().unwrap_or_default();

    // Another tab changes the cart.
    client.post("/cart/add", json!({ "product_id": "cable" })).await;

    let (status, _) = client
        .post(
            "/cart/update",
            json!({ "product_id": "case", "quantity": 4, "expected_revision": seen }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = client
        .post("/cart/clear", json!({ "expected_revision": seen }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, cart) = client.get("/cart").await;
    assert_eq!(quantity_of(&cart, "case"), 1);
    assert_eq!(cart["item_count"], 2);

    let current = cart["revision"].as_u64().unwrap_or_default();
    let (status, cart) = client
        .post(
            "/cart/update",
            json!({ "product_id": "case", "quantity": 4, "expected_revision": current }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quantity_of(&cart, "case"), 4);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let mut alice = TestClient::new();
    alice.post("/cart/add", json!({ "product_id": "case" })).await;

    let mut bob = alice.new_visitor();
    let (_, cart) = bob.get("/cart").await;
    assert_eq!(cart["item_count"], 0);
}

#[tokio::test]
async fn test_merge_cart_from_other_device() {
    let mut phone = TestClient::new();
    phone
        .post("/cart/add", json!({ "product_id": "case", "quantity": 2 }))
        .await;
    let (status, snapshot) = phone.get("/cart/snapshot").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["schema_version"], 1);

    let mut laptop = phone.new_visitor();
    laptop.post("/cart/add", json!({ "product_id": "case" })).await;
    laptop.post("/cart/add", json!({ "product_id": "cable" })).await;

    let (status, merged) = laptop
        .post("/cart/merge", json!({ "cart": snapshot }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(merged["added"], 0);
    assert_eq!(merged["updated"], 1);
    assert_eq!(quantity_of(&merged["cart"], "case"), 3);
    assert_eq!(quantity_of(&merged["cart"], "cable"), 1);

    let (status, _) = laptop
        .post(
            "/cart/merge",
            json!({ "cart": { "schema_version": 99, "items": [] } }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn uploaded_cart(items: Value) -> Value {
    json!({ "cart": { "schema_version": 1, "items": items } })
}

#[tokio::test]
async fn test_merge_holds_uploads_to_catalog_rules() {
    let mut client = TestClient::new();
    client
        .post("/cart/add", json!({ "product_id": "screen", "quantity": 2 }))
        .await;

    let over_limit = uploaded_cart(json!([
        {"product_id": "screen", "name": "OLED Screen", "unit_price": "100.00", "quantity": 2}
    ]));
    let (status, _) = client.post("/cart/merge", over_limit).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let out_of_stock = uploaded_cart(json!([
        {"product_id": "tool", "name": "Heat Gun", "unit_price": "60.00", "quantity": 1}
    ]));
    let (status, _) = client.post("/cart/merge", out_of_stock).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown = uploaded_cart(json!([
        {"product_id": "free-iphone", "name": "iPhone", "unit_price": "0.01", "quantity": 1}
    ]));
    let (status, _) = client.post("/cart/merge", unknown).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let overflow = uploaded_cart(json!([
        {"product_id": "case", "name": "Case", "unit_price": "79228162514264337593543950335", "quantity": 2}
    ]));
    let (status, merged) = client.post("/cart/merge", overflow).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(merged["cart"]["items"][1]["unit_price"], "9.99");
    assert_eq!(merged["cart"]["summary"]["subtotal"], "219.98");

    let (_, cart) = client.get("/cart").await;
    assert_eq!(cart["item_count"], 4);
    assert_eq!(quantity_of(&cart, "screen"), 2);
}

#[tokio::test]
async fn test_merge_rejects_stale_revision_and_forged_discount() {
    let mut client = TestClient::new();
    let (_, cart) = client.post("/cart/add", json!({ "product_id": "case" })).await;
    let revision = cart["revision"].as_u64().unwrap_or_default();

    let mut upload = uploaded_cart(json!([
        {"product_id": "cable", "name": "Cable", "unit_price": "4.99", "quantity": 1}
    ]));
    upload["expected_revision"] = json!(revision + 5);
    let (status, _) = client.post("/cart/merge", upload.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);

    upload["expected_revision"] = json!(revision);
    upload["cart"]["discount"] = json!({"code": "FREE", "kind": "percentage", "value": "100"});
    let (status, merged) = client.post("/cart/merge", upload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(merged["discount_adopted"], false);
    assert_eq!(merged["cart"]["discount"], Value::Null);
    assert_eq!(quantity_of(&merged["cart"], "cable"), 1);
}

// =============================================================================
// Discounts and Tiers
// =============================================================================

#[tokio::test]
async fn test_discount_codes() {
    let mut client = TestClient::new();
    client
        .post("/cart/add", json!({ "product_id": "screen", "quantity": 2 }))
        .await;

    let (status, _) = client.post("/cart/discount", json!({ "code": "BOGUS" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, cart) = client.post("/cart/discount", json!({ "code": "save10" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["discount"]["code"], "SAVE10");
    assert_eq!(cart["summary"]["discount"], "20.00");
    // 180 after the discount is below the free shipping threshold.
    assert_eq!(cart["summary"]["shipping"], "25.00");
    assert_eq!(cart["summary"]["tax"], "9.00");
    assert_eq!(cart["summary"]["total"], "214.00");

    let (status, cart) = client.delete("/cart/discount").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["discount"], Value::Null);
    assert_eq!(cart["summary"]["shipping"], "0.00");
    assert_eq!(cart["summary"]["total"], "210.00");
}

#[tokio::test]
async fn test_tier_price_is_captured_at_add() {
    let mut client = TestClient::new();

    let (_, tier) = client.get("/cart/tier").await;
    assert_eq!(tier["tier"], "retail");

    let (status, _) = client.post("/cart/tier", json!({ "tier": "wholesale" })).await;
    assert_eq!(status, StatusCode::OK);

    let (_, cart) = client.post("/cart/add", json!({ "product_id": "case" })).await;
    assert_eq!(cart["items"][0]["unit_price"], "8.4915");

    // Changing tier does not reprice lines already in the cart.
    client.post("/cart/tier", json!({ "tier": "retail" })).await;
    let (_, cart) = client.get("/cart").await;
    assert_eq!(cart["items"][0]["unit_price"], "8.4915");
}

#[tokio::test]
async fn test_products_show_tier_price() {
    let mut client = TestClient::new();
    client.post("/cart/tier", json!({ "tier": "technician" })).await;

    let (status, product) = client.get("/products/screen").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["price"], "100.00");
    assert_eq!(product["tier_price"], "90.0000");

    let (status, _) = client.get("/products/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, products) = client.get("/products").await;
    assert_eq!(products.as_array().map(Vec::len), Some(4));
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_empty_cart() {
    let mut client = TestClient::new();
    let (status, _) = client.post("/checkout", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = client.get("/checkout/last-order").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_places_order_and_clears_cart() {
    let mut client = TestClient::new();
    client
        .post("/cart/add", json!({ "product_id": "case", "quantity": 2 }))
        .await;
    client.post("/cart/add", json!({ "product_id": "cable" })).await;

    let (status, order) = client.post("/checkout", json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["lines"].as_array().map(Vec::len), Some(2));
    assert_eq!(order["summary"]["total"], "51.22");
    assert!(order["id"].is_string());

    let (_, cart) = client.get("/cart").await;
    assert_eq!(cart["item_count"], 0);

    let (status, last) = client.get("/checkout/last-order").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(last["id"], order["id"]);
}

#[tokio::test]
async fn test_checkout_refuses_repriced_cart() {
    let mut client = TestClient::new();
    client.post("/cart/add", json!({ "product_id": "case" })).await;
    client.post("/cart/add", json!({ "product_id": "screen" })).await;

    client.replace_catalog(
        r#"{"products": [
            {"id": "case", "name": "Case", "price": "10.99"},
            {"id": "screen", "name": "OLED Screen", "price": "100.00", "in_stock": false}
        ]}"#,
    );

    let (status, body) = client.post("/checkout", json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let discrepancies = &body["discrepancies"];
    assert_eq!(discrepancies.as_array().map(Vec::len), Some(2));
    assert_eq!(discrepancies[0]["product_id"], "case");
    assert_eq!(discrepancies[0]["issue"], "price_changed");
    assert_eq!(discrepancies[0]["cart_price"], "9.99");
    assert_eq!(discrepancies[0]["current_price"], "10.99");
    assert_eq!(discrepancies[1]["issue"], "out_of_stock");

    // The cart keeps its snapshot prices until the shopper acts.
    let (_, cart) = client.get("/cart").await;
    assert_eq!(cart["item_count"], 2);
    assert_eq!(quantity_of(&cart, "case"), 1);
}
