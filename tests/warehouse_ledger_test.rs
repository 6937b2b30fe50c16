//! Warehouse stock ledger: inbound/outbound movements, on-hand quantities
//! and the denormalized stock value that follows live catalog prices.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().expect("parse decimal")
}

async fn create_warehouse(app: &TestApp, token: &str, name: &str) -> Value {
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/warehouses",
            Some(json!({ "name": name, "region": "Ashanti", "city": "Kumasi" })),
            token,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await["data"].clone()
}

async fn move_stock(
    app: &TestApp,
    token: &str,
    warehouse_id: &str,
    action: &str,
    product_id: Uuid,
    quantity: i32,
) -> axum::response::Response {
    app.request_authenticated(
        Method::POST,
        &format!("/api/v1/warehouses/{}/inventory/{}", warehouse_id, action),
        Some(json!({ "product_id": product_id, "quantity": quantity })),
        token,
    )
    .await
}

// ==================== Warehouse Tests ====================

#[tokio::test]
async fn warehouses_start_empty_with_zero_value() {
    let app = TestApp::new().await;
    let (_, token) = app.warehouse_user().await;

    let created = create_warehouse(&app, &token, "Kumasi Central Depot").await;
    assert_eq!(created["name"], "Kumasi Central Depot");
    assert_eq!(decimal(&created["total_stock_value"]), Decimal::ZERO);

    let listed = app
        .request_authenticated(Method::GET, "/api/v1/warehouses", None, &token)
        .await;
    let body = response_json(listed).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Kumasi Central Depot"));

    let inventory = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/warehouses/{}/inventory", created["id"].as_str().unwrap()),
            None,
            &token,
        )
        .await;
    let inventory_body = response_json(inventory).await;
    assert!(inventory_body["data"]["lines"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn add_then_remove_returns_to_the_starting_quantity() {
    let app = TestApp::new().await;
    let (farmer, _) = app.verified_farmer().await;
    let (_, token) = app.warehouse_user().await;
    let maize = app.seed_product(farmer.id, "White Maize", dec!(3.00), 500).await;
    let warehouse = create_warehouse(&app, &token, "Tema Silo").await;
    let warehouse_id = warehouse["id"].as_str().unwrap().to_string();

    let added = move_stock(&app, &token, &warehouse_id, "add", maize.id, 40).await;
    assert_eq!(added.status(), StatusCode::OK);
    let added_body = response_json(added).await;
    assert_eq!(added_body["data"]["quantity_on_hand"], 40);
    assert_eq!(added_body["data"]["movement"]["direction"], "inbound");
    assert_eq!(added_body["data"]["movement"]["quantity"], 40);

    let removed = move_stock(&app, &token, &warehouse_id, "remove", maize.id, 40).await;
    assert_eq!(removed.status(), StatusCode::OK);
    let removed_body = response_json(removed).await;
    assert_eq!(removed_body["data"]["quantity_on_hand"], 0);
    assert_eq!(removed_body["data"]["movement"]["direction"], "outbound");
    assert_eq!(decimal(&removed_body["data"]["total_stock_value"]), Decimal::ZERO);

    // Both sides of the round trip stay on the ledger, newest first.
    let movements = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/warehouses/{}/movements", warehouse_id),
            None,
            &token,
        )
        .await;
    let ledger = response_json(movements).await;
    assert_eq!(ledger["data"]["total"], 2);
    assert_eq!(ledger["data"]["items"][0]["direction"], "outbound");
    assert_eq!(ledger["data"]["items"][1]["direction"], "inbound");
}

#[tokio::test]
async fn stock_value_is_priced_at_live_catalog_prices() {
    let app = TestApp::new().await;
    let (farmer, farmer_token) = app.verified_farmer().await;
    let (_, token) = app.warehouse_user().await;
    let cocoa = app.seed_product(farmer.id, "Cocoa Beans", dec!(8.50), 1000).await;
    let warehouse = create_warehouse(&app, &token, "Takoradi Store").await;
    let warehouse_id = warehouse["id"].as_str().unwrap().to_string();

    let added = move_stock(&app, &token, &warehouse_id, "add", cocoa.id, 10).await;
    let added_body = response_json(added).await;
    assert_eq!(decimal(&added_body["data"]["total_stock_value"]), dec!(85.00));

    // A catalog price change revalues the stock on the next movement.
    app.request_authenticated(
        Method::PUT,
        &format!("/api/v1/products/{}", cocoa.id),
        Some(json!({ "price": "10.00" })),
        &farmer_token,
    )
    .await;

    let topped_up = move_stock(&app, &token, &warehouse_id, "add", cocoa.id, 2).await;
    let topped_up_body = response_json(topped_up).await;
    assert_eq!(topped_up_body["data"]["quantity_on_hand"], 12);
    assert_eq!(
        decimal(&topped_up_body["data"]["total_stock_value"]),
        dec!(120.00)
    );

    let inventory = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/warehouses/{}/inventory", warehouse_id),
            None,
            &token,
        )
        .await;
    let inventory_body = response_json(inventory).await;
    let line = &inventory_body["data"]["lines"][0];
    assert_eq!(line["product_name"], "Cocoa Beans");
    assert_eq!(line["quantity_on_hand"], 12);
    assert_eq!(decimal(&line["unit_price"]), dec!(10.00));
    assert_eq!(decimal(&line["line_value"]), dec!(120.00));
}

#[tokio::test]
async fn removals_never_exceed_on_hand_stock() {
    let app = TestApp::new().await;
    let (farmer, _) = app.verified_farmer().await;
    let (_, token) = app.warehouse_user().await;
    let shea = app.seed_product(farmer.id, "Shea Nuts", dec!(5.00), 200).await;
    let warehouse = create_warehouse(&app, &token, "Tamale Depot").await;
    let warehouse_id = warehouse["id"].as_str().unwrap().to_string();

    move_stock(&app, &token, &warehouse_id, "add", shea.id, 5).await;

    let over = move_stock(&app, &token, &warehouse_id, "remove", shea.id, 8).await;
    assert_eq!(over.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(over).await;
    assert_eq!(body["error"]["code"], "INSUFFICIENT_INVENTORY");

    // The failed removal appears nowhere: quantity and ledger are untouched.
    let movements = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/warehouses/{}/movements", warehouse_id),
            None,
            &token,
        )
        .await;
    let ledger = response_json(movements).await;
    assert_eq!(ledger["data"]["total"], 1);
    assert_eq!(ledger["data"]["items"][0]["direction"], "inbound");
}

#[tokio::test]
async fn removing_a_product_never_stocked_is_rejected() {
    let app = TestApp::new().await;
    let (farmer, _) = app.verified_farmer().await;
    let (_, token) = app.warehouse_user().await;
    let millet = app.seed_product(farmer.id, "Millet", dec!(4.00), 100).await;
    let warehouse = create_warehouse(&app, &token, "Bolga Depot").await;
    let warehouse_id = warehouse["id"].as_str().unwrap().to_string();

    let response = move_stock(&app, &token, &warehouse_id, "remove", millet.id, 1).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "INSUFFICIENT_INVENTORY");
}

// ==================== Access Control Tests ====================

#[tokio::test]
async fn warehouse_routes_are_closed_to_buyers_and_farmers() {
    let app = TestApp::new().await;
    let (_, buyer_token) = app.buyer().await;
    let (_, farmer_token) = app.verified_farmer().await;

    for token in [&buyer_token, &farmer_token] {
        let response = app
            .request_authenticated(Method::GET, "/api/v1/warehouses", None, token)
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = response_json(response).await;
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }
}

#[tokio::test]
async fn admins_can_operate_warehouses() {
    let app = TestApp::new().await;
    let (farmer, _) = app.verified_farmer().await;
    let (_, admin_token) = app.admin().await;
    let sorghum = app.seed_product(farmer.id, "Sorghum", dec!(6.00), 80).await;

    let warehouse = create_warehouse(&app, &admin_token, "Accra North Depot").await;
    let response = move_stock(
        &app,
        &admin_token,
        warehouse["id"].as_str().unwrap(),
        "add",
        sorghum.id,
        10,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}
