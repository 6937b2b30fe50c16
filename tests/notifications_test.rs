//! In-app notifications produced by the order flow, plus the health and
//! readiness probes.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

async fn place_an_order(app: &TestApp) -> String {
    let (farmer, _) = app.verified_farmer().await;
    let (buyer, buyer_token) = app.buyer().await;
    let spinach = app.seed_product(farmer.id, "Spinach", dec!(2.50), 20).await;
    let address = app.seed_address(buyer.id).await;

    app.request_authenticated(
        Method::POST,
        "/api/v1/cart/items",
        Some(json!({ "product_id": spinach.id, "quantity": 2 })),
        &buyer_token,
    )
    .await;
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({ "address_id": address.id, "payment_method": "mobile_money" })),
            &buyer_token,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    buyer_token
}

// ==================== Notification Tests ====================

#[tokio::test]
async fn order_placement_notifies_the_buyer() {
    let app = TestApp::new().await;
    let buyer_token = place_an_order(&app).await;

    let response = app
        .request_authenticated(Method::GET, "/api/v1/notifications", None, &buyer_token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["unread"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "Order placed");
}

#[tokio::test]
async fn reading_a_notification_clears_the_badge() {
    let app = TestApp::new().await;
    let buyer_token = place_an_order(&app).await;

    let listed = app
        .request_authenticated(Method::GET, "/api/v1/notifications", None, &buyer_token)
        .await;
    let listed_body = response_json(listed).await;
    let id = listed_body["data"]["items"][0]["id"].as_str().unwrap().to_string();

    let marked = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/notifications/{}/read", id),
            None,
            &buyer_token,
        )
        .await;
    assert_eq!(marked.status(), StatusCode::OK);
    let marked_body = response_json(marked).await;
    assert!(!marked_body["data"]["read_at"].is_null());

    let relisted = app
        .request_authenticated(Method::GET, "/api/v1/notifications", None, &buyer_token)
        .await;
    let relisted_body = response_json(relisted).await;
    assert_eq!(relisted_body["data"]["unread"], 0);

    // Re-reading an already-read notification changes nothing.
    let again = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/notifications/{}/read", id),
            None,
            &buyer_token,
        )
        .await;
    assert_eq!(again.status(), StatusCode::OK);
}

#[tokio::test]
async fn read_all_reports_how_many_rows_changed() {
    let app = TestApp::new().await;
    let (farmer, _) = app.verified_farmer().await;
    let (buyer, buyer_token) = app.buyer().await;
    let kale = app.seed_product(farmer.id, "Kale", dec!(3.00), 50).await;
    let address = app.seed_address(buyer.id).await;

    for _ in 0..2 {
        app.request_authenticated(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({ "product_id": kale.id, "quantity": 1 })),
            &buyer_token,
        )
        .await;
        app.request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({ "address_id": address.id, "payment_method": "mobile_money" })),
            &buyer_token,
        )
        .await;
    }

    let response = app
        .request_authenticated(Method::POST, "/api/v1/notifications/read-all", None, &buyer_token)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["marked"], 2);

    let repeat = app
        .request_authenticated(Method::POST, "/api/v1/notifications/read-all", None, &buyer_token)
        .await;
    let repeat_body = response_json(repeat).await;
    assert_eq!(repeat_body["data"]["marked"], 0);
}

#[tokio::test]
async fn notifications_are_private_per_user() {
    let app = TestApp::new().await;
    let buyer_token = place_an_order(&app).await;
    let (_, other_token) = app.buyer().await;

    let own = app
        .request_authenticated(Method::GET, "/api/v1/notifications", None, &buyer_token)
        .await;
    let own_body = response_json(own).await;
    let id = own_body["data"]["items"][0]["id"].as_str().unwrap().to_string();

    let foreign_list = app
        .request_authenticated(Method::GET, "/api/v1/notifications", None, &other_token)
        .await;
    let foreign_body = response_json(foreign_list).await;
    assert_eq!(foreign_body["data"]["total"], 0);

    // Another user's notification cannot be marked read.
    let foreign_mark = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/notifications/{}/read", id),
            None,
            &other_token,
        )
        .await;
    assert_eq!(foreign_mark.status(), StatusCode::NOT_FOUND);
}

// ==================== Probe Tests ====================

#[tokio::test]
async fn liveness_answers_without_auth() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "up");
    assert!(body["version"].as_str().is_some());
}

#[tokio::test]
async fn readiness_reports_the_database_check() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/status", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["database"]["status"], "up");
}

#[tokio::test]
async fn the_openapi_document_is_served() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["paths"].get("/api/v1/orders").is_some());
    assert!(body["paths"].get("/api/v1/payments/callback").is_some());
}
