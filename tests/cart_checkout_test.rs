//! Cart behavior and checkout: frozen prices, the subtotal arithmetic,
//! the flat delivery fee and the all-or-nothing stock decrement.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected decimal string, got {}", value))
        .parse()
        .expect("parse decimal")
}

// ==================== Cart Tests ====================

#[tokio::test]
async fn cart_subtotal_uses_frozen_unit_prices() {
    let app = TestApp::new().await;
    let (farmer, _) = app.verified_farmer().await;
    let (_, buyer_token) = app.buyer().await;
    let tomatoes = app
        .seed_product(farmer.id, "Fresh Tomatoes", dec!(8.50), 10)
        .await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({ "product_id": tomatoes.id, "quantity": 2 })),
            &buyer_token,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;

    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(decimal(&items[0]["unit_price"]), dec!(8.50));
    assert_eq!(decimal(&items[0]["line_total"]), dec!(17.00));
    assert_eq!(decimal(&body["data"]["subtotal"]), dec!(17.00));
}

#[tokio::test]
async fn adding_the_same_product_again_merges_the_line() {
    let app = TestApp::new().await;
    let (farmer, _) = app.verified_farmer().await;
    let (_, buyer_token) = app.buyer().await;
    let yams = app.seed_product(farmer.id, "Puna Yams", dec!(12.00), 30).await;

    for quantity in [2, 3] {
        app.request_authenticated(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({ "product_id": yams.id, "quantity": quantity })),
            &buyer_token,
        )
        .await;
    }

    let response = app
        .request_authenticated(Method::GET, "/api/v1/cart", None, &buyer_token)
        .await;
    let body = response_json(response).await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(decimal(&body["data"]["subtotal"]), dec!(60.00));
}

#[tokio::test]
async fn updating_a_line_to_zero_removes_it() {
    let app = TestApp::new().await;
    let (farmer, _) = app.verified_farmer().await;
    let (_, buyer_token) = app.buyer().await;
    let maize = app.seed_product(farmer.id, "Maize", dec!(4.00), 50).await;

    let added = app
        .request_authenticated(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({ "product_id": maize.id, "quantity": 3 })),
            &buyer_token,
        )
        .await;
    let added_body = response_json(added).await;
    let item_id = added_body["data"]["items"][0]["id"].as_str().unwrap().to_string();

    let updated = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/cart/items/{}", item_id),
            Some(json!({ "quantity": 7 })),
            &buyer_token,
        )
        .await;
    let updated_body = response_json(updated).await;
    assert_eq!(updated_body["data"]["items"][0]["quantity"], 7);

    let emptied = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/cart/items/{}", item_id),
            Some(json!({ "quantity": 0 })),
            &buyer_token,
        )
        .await;
    let emptied_body = response_json(emptied).await;
    assert!(emptied_body["data"]["items"].as_array().unwrap().is_empty());
    assert_eq!(decimal(&emptied_body["data"]["subtotal"]), Decimal::ZERO);
}

#[tokio::test]
async fn carts_are_private_per_user() {
    let app = TestApp::new().await;
    let (farmer, _) = app.verified_farmer().await;
    let (_, first_token) = app.buyer().await;
    let (_, second_token) = app.buyer().await;
    let peppers = app.seed_product(farmer.id, "Peppers", dec!(6.00), 20).await;

    app.request_authenticated(
        Method::POST,
        "/api/v1/cart/items",
        Some(json!({ "product_id": peppers.id, "quantity": 4 })),
        &first_token,
    )
    .await;

    let other_cart = app
        .request_authenticated(Method::GET, "/api/v1/cart", None, &second_token)
        .await;
    let body = response_json(other_cart).await;
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}

// ==================== Price Drift Tests ====================

#[tokio::test]
async fn price_change_leaves_the_cart_frozen_and_validate_reports_it() {
    let app = TestApp::new().await;
    let (farmer, farmer_token) = app.verified_farmer().await;
    let (_, buyer_token) = app.buyer().await;
    let tomatoes = app
        .seed_product(farmer.id, "Roma Tomatoes", dec!(8.50), 10)
        .await;

    app.request_authenticated(
        Method::POST,
        "/api/v1/cart/items",
        Some(json!({ "product_id": tomatoes.id, "quantity": 2 })),
        &buyer_token,
    )
    .await;

    // The farmer raises the price after the buyer added the product.
    let repriced = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/products/{}", tomatoes.id),
            Some(json!({ "price": "10.00" })),
            &farmer_token,
        )
        .await;
    assert_eq!(repriced.status(), StatusCode::OK);

    let cart = app
        .request_authenticated(Method::GET, "/api/v1/cart", None, &buyer_token)
        .await;
    let cart_body = response_json(cart).await;
    assert_eq!(
        decimal(&cart_body["data"]["items"][0]["unit_price"]),
        dec!(8.50)
    );

    let validated = app
        .request_authenticated(Method::GET, "/api/v1/cart/validate", None, &buyer_token)
        .await;
    let validated_body = response_json(validated).await;
    assert_eq!(validated_body["data"]["valid"], false);
    let issues = validated_body["data"]["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["code"], "PRICE_CHANGED");
    assert_eq!(decimal(&issues[0]["frozen_price"]), dec!(8.50));
    assert_eq!(decimal(&issues[0]["live_price"]), dec!(10.00));
}

#[tokio::test]
async fn validate_reports_insufficient_stock_without_mutating() {
    let app = TestApp::new().await;
    let (farmer, farmer_token) = app.verified_farmer().await;
    let (_, buyer_token) = app.buyer().await;
    let onions = app.seed_product(farmer.id, "Red Onions", dec!(5.00), 10).await;

    app.request_authenticated(
        Method::POST,
        "/api/v1/cart/items",
        Some(json!({ "product_id": onions.id, "quantity": 6 })),
        &buyer_token,
    )
    .await;

    // Stock drops below the carted quantity.
    app.request_authenticated(
        Method::PUT,
        &format!("/api/v1/products/{}", onions.id),
        Some(json!({ "quantity_available": 2 })),
        &farmer_token,
    )
    .await;

    let validated = app
        .request_authenticated(Method::GET, "/api/v1/cart/validate", None, &buyer_token)
        .await;
    let body = response_json(validated).await;
    assert_eq!(body["data"]["valid"], false);
    assert_eq!(body["data"]["issues"][0]["code"], "INSUFFICIENT_STOCK");

    // Validation never touches the cart line itself.
    let cart = app
        .request_authenticated(Method::GET, "/api/v1/cart", None, &buyer_token)
        .await;
    let cart_body = response_json(cart).await;
    assert_eq!(cart_body["data"]["items"][0]["quantity"], 6);
}

// ==================== Checkout Tests ====================

#[tokio::test]
async fn checkout_totals_add_the_flat_delivery_fee() {
    let app = TestApp::new().await;
    let (farmer, _) = app.verified_farmer().await;
    let (buyer, buyer_token) = app.buyer().await;
    let tomatoes = app
        .seed_product(farmer.id, "Cherry Tomatoes", dec!(8.50), 10)
        .await;
    let address = app.seed_address(buyer.id).await;

    app.request_authenticated(
        Method::POST,
        "/api/v1/cart/items",
        Some(json!({ "product_id": tomatoes.id, "quantity": 2 })),
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
    let body = response_json(response).await;

    assert_eq!(decimal(&body["data"]["subtotal"]), dec!(17.00));
    assert_eq!(decimal(&body["data"]["delivery_fee"]), dec!(5.00));
    assert_eq!(decimal(&body["data"]["total_amount"]), dec!(22.00));
    assert_eq!(body["data"]["currency"], "GHS");
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["payment_status"], "pending");
    assert!(body["data"]["order_number"]
        .as_str()
        .unwrap()
        .starts_with("FC-"));
    // The delivery address was snapshotted into the order
    assert_eq!(body["data"]["delivery_city"], "Accra");

    // Stock moved and the cart is empty again
    let row = app.product_row(tomatoes.id).await;
    assert_eq!(row.quantity_available, 8);
    assert_eq!(row.sold_count, 2);

    let cart = app
        .request_authenticated(Method::GET, "/api/v1/cart", None, &buyer_token)
        .await;
    let cart_body = response_json(cart).await;
    assert!(cart_body["data"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn checkout_charges_frozen_prices_not_live_ones() {
    let app = TestApp::new().await;
    let (farmer, farmer_token) = app.verified_farmer().await;
    let (buyer, buyer_token) = app.buyer().await;
    let garden_eggs = app
        .seed_product(farmer.id, "Garden Eggs", dec!(8.50), 10)
        .await;
    let address = app.seed_address(buyer.id).await;

    app.request_authenticated(
        Method::POST,
        "/api/v1/cart/items",
        Some(json!({ "product_id": garden_eggs.id, "quantity": 2 })),
        &buyer_token,
    )
    .await;

    app.request_authenticated(
        Method::PUT,
        &format!("/api/v1/products/{}", garden_eggs.id),
        Some(json!({ "price": "12.00" })),
        &farmer_token,
    )
    .await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({ "address_id": address.id, "payment_method": "cash_on_delivery" })),
            &buyer_token,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(decimal(&body["data"]["subtotal"]), dec!(17.00));
    assert_eq!(decimal(&body["data"]["items"][0]["unit_price"]), dec!(8.50));
}

#[tokio::test]
async fn checkout_with_an_empty_cart_is_rejected() {
    let app = TestApp::new().await;
    let (buyer, buyer_token) = app.buyer().await;
    let address = app.seed_address(buyer.id).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({ "address_id": address.id, "payment_method": "mobile_money" })),
            &buyer_token,
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "EMPTY_CART");
}

#[tokio::test]
async fn checkout_rejects_an_address_that_is_not_yours() {
    let app = TestApp::new().await;
    let (farmer, _) = app.verified_farmer().await;
    let (_, buyer_token) = app.buyer().await;
    let (other, _) = app.buyer().await;
    let okra = app.seed_product(farmer.id, "Okra", dec!(3.00), 15).await;
    let foreign_address = app.seed_address(other.id).await;

    app.request_authenticated(
        Method::POST,
        "/api/v1/cart/items",
        Some(json!({ "product_id": okra.id, "quantity": 1 })),
        &buyer_token,
    )
    .await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({ "address_id": foreign_address.id, "payment_method": "mobile_money" })),
            &buyer_token,
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_ADDRESS");
}

#[tokio::test]
async fn failed_checkout_writes_nothing_at_all() {
    let app = TestApp::new().await;
    let (farmer, _) = app.verified_farmer().await;
    let (buyer, buyer_token) = app.buyer().await;
    let plantain = app
        .seed_product(farmer.id, "Plantain", dec!(7.00), 50)
        .await;
    let cassava = app.seed_product(farmer.id, "Cassava", dec!(4.00), 1).await;
    let address = app.seed_address(buyer.id).await;

    app.request_authenticated(
        Method::POST,
        "/api/v1/cart/items",
        Some(json!({ "product_id": plantain.id, "quantity": 2 })),
        &buyer_token,
    )
    .await;
    app.request_authenticated(
        Method::POST,
        "/api/v1/cart/items",
        Some(json!({ "product_id": cassava.id, "quantity": 3 })),
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
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "INSUFFICIENT_STOCK");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Cassava"));

    // Nothing was decremented, including the product that had stock.
    let plantain_row = app.product_row(plantain.id).await;
    assert_eq!(plantain_row.quantity_available, 50);
    assert_eq!(plantain_row.sold_count, 0);
    let cassava_row = app.product_row(cassava.id).await;
    assert_eq!(cassava_row.quantity_available, 1);

    // No order appeared and the cart is untouched.
    let orders = app
        .request_authenticated(Method::GET, "/api/v1/orders", None, &buyer_token)
        .await;
    let orders_body = response_json(orders).await;
    assert_eq!(orders_body["data"]["total"], 0);

    let cart = app
        .request_authenticated(Method::GET, "/api/v1/cart", None, &buyer_token)
        .await;
    let cart_body = response_json(cart).await;
    assert_eq!(cart_body["data"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn checkout_clears_only_the_buyers_cart() {
    let app = TestApp::new().await;
    let (farmer, _) = app.verified_farmer().await;
    let (first, first_token) = app.buyer().await;
    let (_, second_token) = app.buyer().await;
    let mangoes = app.seed_product(farmer.id, "Mangoes", dec!(2.50), 40).await;
    let address = app.seed_address(first.id).await;

    for token in [&first_token, &second_token] {
        app.request_authenticated(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({ "product_id": mangoes.id, "quantity": 4 })),
            token,
        )
        .await;
    }

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({ "address_id": address.id, "payment_method": "mobile_money" })),
            &first_token,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let other_cart = app
        .request_authenticated(Method::GET, "/api/v1/cart", None, &second_token)
        .await;
    let body = response_json(other_cart).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
}
