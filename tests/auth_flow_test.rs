//! End-to-end tests for registration, login, the failed-login lockout
//! and profile management.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, unique_email, unique_phone, TestApp, TEST_PASSWORD};
use serde_json::json;

// ==================== Registration Tests ====================

#[tokio::test]
async fn register_buyer_is_approved_immediately() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "email": unique_email("ama"),
                "password": TEST_PASSWORD,
                "phone": "0241234567",
                "full_name": "Ama Mensah",
                "role": "buyer"
            })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert!(body["data"]["access_token"].as_str().is_some());
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(body["data"]["user"]["role"], "buyer");
    assert_eq!(body["data"]["user"]["verification_status"], "approved");
    // The phone is normalized to international form
    assert_eq!(body["data"]["user"]["phone"], "+233241234567");
    // The password hash never leaves the server
    assert!(body["data"]["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn register_farmer_starts_unverified() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "email": unique_email("kofi"),
                "password": TEST_PASSWORD,
                "phone": unique_phone(),
                "full_name": "Kofi Boateng",
                "role": "farmer"
            })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["user"]["role"], "farmer");
    assert_eq!(body["data"]["user"]["verification_status"], "unverified");
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = TestApp::new().await;
    let email = unique_email("dupe");

    let payload = |phone: &str| {
        json!({
            "email": email,
            "password": TEST_PASSWORD,
            "phone": phone,
            "full_name": "First Registrant",
            "role": "buyer"
        })
    };

    let first = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(payload("0241000001")),
            None,
        )
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(payload("0241000002")),
            None,
        )
        .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = response_json(second).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "EMAIL_IN_USE");
}

#[tokio::test]
async fn register_rejects_non_ghana_phone() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "email": unique_email("phone"),
                "password": TEST_PASSWORD,
                "phone": "+14155550123",
                "full_name": "Wrong Phone",
                "role": "buyer"
            })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn register_rejects_weak_password() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "email": unique_email("weak"),
                "password": "alllowercase",
                "phone": unique_phone(),
                "full_name": "Weak Password",
                "role": "buyer"
            })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_admin_role() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "email": unique_email("sneaky"),
                "password": TEST_PASSWORD,
                "phone": unique_phone(),
                "full_name": "Sneaky Admin",
                "role": "admin"
            })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ==================== Login Tests ====================

#[tokio::test]
async fn login_returns_token_for_valid_credentials() {
    let app = TestApp::new().await;
    let (account, _) = app.buyer().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": account.email, "password": TEST_PASSWORD })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["data"]["access_token"].as_str().is_some());
    assert_eq!(body["data"]["user"]["id"], account.id.to_string());
}

#[tokio::test]
async fn login_is_case_insensitive_on_email() {
    let app = TestApp::new().await;
    let (account, _) = app.buyer().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({
                "email": account.email.to_uppercase(),
                "password": TEST_PASSWORD
            })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_rejects_wrong_password_and_unknown_email() {
    let app = TestApp::new().await;
    let (account, _) = app.buyer().await;

    let wrong_password = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": account.email, "password": "Wr0ng!Password" })),
            None,
        )
        .await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(wrong_password).await;
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");

    let unknown = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": unique_email("ghost"), "password": TEST_PASSWORD })),
            None,
        )
        .await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
}

// ==================== Lockout Tests ====================

#[tokio::test]
async fn five_failed_logins_lock_the_account() {
    let app = TestApp::new().await;
    let (account, _) = app.buyer().await;

    for _ in 0..5 {
        let response = app
            .request(
                Method::POST,
                "/api/v1/auth/login",
                Some(json!({ "email": account.email, "password": "Wr0ng!Password" })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // The sixth attempt is rejected with a lockout even though the
    // password is now correct.
    let locked = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": account.email, "password": TEST_PASSWORD })),
            None,
        )
        .await;
    assert_eq!(locked.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after = locked
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .expect("Retry-After header");
    assert!(retry_after > 0 && retry_after <= 15 * 60);

    let body = response_json(locked).await;
    assert_eq!(body["error"]["code"], "ACCOUNT_LOCKED");
}

#[tokio::test]
async fn failed_attempts_reset_after_successful_login() {
    let app = TestApp::new().await;
    let (account, _) = app.buyer().await;

    for _ in 0..4 {
        app.request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": account.email, "password": "Wr0ng!Password" })),
            None,
        )
        .await;
    }

    // A success inside the window clears the counter, so four more
    // failures still do not lock.
    let success = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": account.email, "password": TEST_PASSWORD })),
            None,
        )
        .await;
    assert_eq!(success.status(), StatusCode::OK);

    for _ in 0..4 {
        let response = app
            .request(
                Method::POST,
                "/api/v1/auth/login",
                Some(json!({ "email": account.email, "password": "Wr0ng!Password" })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let still_fine = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": account.email, "password": TEST_PASSWORD })),
            None,
        )
        .await;
    assert_eq!(still_fine.status(), StatusCode::OK);
}

// ==================== Profile Tests ====================

#[tokio::test]
async fn me_requires_a_token() {
    let app = TestApp::new().await;

    let anonymous = app.request(Method::GET, "/api/v1/auth/me", None, None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let garbage = app
        .request(Method::GET, "/api/v1/auth/me", None, Some("not-a-jwt"))
        .await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_profile_with_farmer_details() {
    let app = TestApp::new().await;
    let (_, farmer_token) = app.verified_farmer().await;

    let update = app
        .request_authenticated(
            Method::PUT,
            "/api/v1/auth/me",
            Some(json!({
                "farm_name": "Green Valley Farms",
                "region": "Ashanti",
                "bio": "Third generation cocoa and vegetable farm."
            })),
            &farmer_token,
        )
        .await;
    assert_eq!(update.status(), StatusCode::OK);

    let response = app
        .request_authenticated(Method::GET, "/api/v1/auth/me", None, &farmer_token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(
        body["data"]["farmer_profile"]["farm_name"],
        "Green Valley Farms"
    );
    assert_eq!(body["data"]["farmer_profile"]["region"], "Ashanti");
}

#[tokio::test]
async fn buyers_have_no_farmer_profile() {
    let app = TestApp::new().await;
    let (_, buyer_token) = app.buyer().await;

    let response = app
        .request_authenticated(Method::GET, "/api/v1/auth/me", None, &buyer_token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["data"].get("farmer_profile").is_none());
}

#[tokio::test]
async fn change_password_verifies_the_current_one() {
    let app = TestApp::new().await;
    let (account, token) = app.buyer().await;

    let rejected = app
        .request_authenticated(
            Method::POST,
            "/api/v1/auth/change-password",
            Some(json!({
                "current_password": "Wr0ng!Password",
                "new_password": "An0ther!Passw0rd"
            })),
            &token,
        )
        .await;
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);

    let changed = app
        .request_authenticated(
            Method::POST,
            "/api/v1/auth/change-password",
            Some(json!({
                "current_password": TEST_PASSWORD,
                "new_password": "An0ther!Passw0rd"
            })),
            &token,
        )
        .await;
    assert_eq!(changed.status(), StatusCode::NO_CONTENT);

    let relogin = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": account.email, "password": "An0ther!Passw0rd" })),
            None,
        )
        .await;
    assert_eq!(relogin.status(), StatusCode::OK);
}

// ==================== Address Tests ====================

#[tokio::test]
async fn addresses_can_be_added_listed_and_removed() {
    let app = TestApp::new().await;
    let (_, token) = app.buyer().await;

    let created = app
        .request_authenticated(
            Method::POST,
            "/api/v1/auth/addresses",
            Some(json!({
                "label": "Work",
                "region": "Greater Accra",
                "city": "Accra",
                "street": "14 Independence Avenue",
                "contact_phone": "0501234567"
            })),
            &token,
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created_body = response_json(created).await;
    let address_id = created_body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(created_body["data"]["contact_phone"], "+233501234567");

    let listed = app
        .request_authenticated(Method::GET, "/api/v1/auth/addresses", None, &token)
        .await;
    let listed_body = response_json(listed).await;
    assert_eq!(listed_body["data"].as_array().unwrap().len(), 1);

    let removed = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/auth/addresses/{}", address_id),
            None,
            &token,
        )
        .await;
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);

    let after = app
        .request_authenticated(Method::GET, "/api/v1/auth/addresses", None, &token)
        .await;
    let after_body = response_json(after).await;
    assert!(after_body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn error_envelope_carries_a_request_id() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/auth/me", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["request_id"].as_str().is_some());
    assert!(body["timestamp"].as_str().is_some());
}
