//! Farmer verification: the six-step application, the OTP round trip,
//! the automated level-1 checks and the admin's level-2 decision.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{response_json, TestApp};
use farmconnect_api::entities::verification_otp;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::{json, Value};
use uuid::Uuid;

fn step_payload(step: i32) -> Value {
    match step {
        0 => json!({
            "full_name": "Ama Serwaa",
            "id_type": "ghana_card",
            "id_number": "GHA-123456789-1"
        }),
        1 => json!({
            "farm_name": "Serwaa Farms",
            "farm_region": "Ashanti",
            "farm_district": "Ejisu",
            "farm_size_acres": "12.5",
            "primary_crops": "maize, cassava"
        }),
        2 => json!({ "mobile_money_number": "0551234567" }),
        3 => json!({
            "id_front_url": "https://cdn.farmconnect.test/id-front.jpg",
            "selfie_url": "https://cdn.farmconnect.test/selfie.jpg"
        }),
        4 => json!({ "verification_phone": "0551234567" }),
        _ => json!({
            "consent_terms": true,
            "consent_data_sharing": true,
            "consent_farm_visit": true
        }),
    }
}

async fn submit_step(app: &TestApp, token: &str, step: i32) -> axum::response::Response {
    app.request_authenticated(
        Method::POST,
        &format!("/api/v1/farmers/verify/step/{}", step),
        Some(step_payload(step)),
        token,
    )
    .await
}

/// Walks all six steps; does not touch the OTP.
async fn complete_steps(app: &TestApp, token: &str) {
    app.request_authenticated(Method::POST, "/api/v1/farmers/verify/initiate", None, token)
        .await;
    for step in 0..6 {
        let response = submit_step(app, token, step).await;
        assert_eq!(response.status(), StatusCode::OK, "step {}", step);
    }
}

/// Pulls the live code straight from the database; the SMS provider is a
/// stub in tests.
async fn latest_otp(app: &TestApp, user_id: Uuid) -> verification_otp::Model {
    verification_otp::Entity::find()
        .filter(verification_otp::Column::UserId.eq(user_id))
        .filter(verification_otp::Column::ConsumedAt.is_null())
        .order_by_desc(verification_otp::Column::CreatedAt)
        .one(&*app.state.db)
        .await
        .expect("query otp")
        .expect("an unconsumed otp row")
}

async fn confirm_phone(app: &TestApp, token: &str, user_id: Uuid) {
    let sent = app
        .request_authenticated(Method::POST, "/api/v1/farmers/verify/otp/send", None, token)
        .await;
    assert_eq!(sent.status(), StatusCode::OK);
    let code = latest_otp(app, user_id).await.code;
    let verified = app
        .request_authenticated(
            Method::POST,
            "/api/v1/farmers/verify/otp/verify",
            Some(json!({ "code": code })),
            token,
        )
        .await;
    assert_eq!(verified.status(), StatusCode::OK);
}

// ==================== Application Tests ====================

#[tokio::test]
async fn verification_is_for_farmers_only() {
    let app = TestApp::new().await;
    let (_, buyer_token) = app.buyer().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/farmers/verify/initiate",
            None,
            &buyer_token,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn initiate_returns_the_same_record_when_repeated() {
    let app = TestApp::new().await;
    let (_, token) = app.unverified_farmer().await;

    let first = app
        .request_authenticated(Method::POST, "/api/v1/farmers/verify/initiate", None, &token)
        .await;
    let first_body = response_json(first).await;
    assert_eq!(first_body["data"]["current_step"], 0);
    assert_eq!(first_body["data"]["level_1_status"], "not_started");

    let second = app
        .request_authenticated(Method::POST, "/api/v1/farmers/verify/initiate", None, &token)
        .await;
    let second_body = response_json(second).await;
    assert_eq!(second_body["data"]["id"], first_body["data"]["id"]);
}

#[tokio::test]
async fn steps_advance_the_cursor_and_resubmission_keeps_it() {
    let app = TestApp::new().await;
    let (_, token) = app.unverified_farmer().await;
    app.request_authenticated(Method::POST, "/api/v1/farmers/verify/initiate", None, &token)
        .await;

    let after_identity = response_json(submit_step(&app, &token, 0).await).await;
    assert_eq!(after_identity["data"]["current_step"], 1);
    assert_eq!(after_identity["data"]["full_name"], "Ama Serwaa");

    let after_farm = response_json(submit_step(&app, &token, 1).await).await;
    assert_eq!(after_farm["data"]["current_step"], 2);

    // Correcting an earlier step rewrites its fields but never rewinds.
    let corrected = app
        .request_authenticated(
            Method::POST,
            "/api/v1/farmers/verify/step/0",
            Some(json!({
                "full_name": "Ama Serwaa Mensah",
                "id_type": "ghana_card",
                "id_number": "GHA-123456789-1"
            })),
            &token,
        )
        .await;
    let body = response_json(corrected).await;
    assert_eq!(body["data"]["current_step"], 2);
    assert_eq!(body["data"]["full_name"], "Ama Serwaa Mensah");
}

#[tokio::test]
async fn step_payloads_are_validated() {
    let app = TestApp::new().await;
    let (_, token) = app.unverified_farmer().await;
    app.request_authenticated(Method::POST, "/api/v1/farmers/verify/initiate", None, &token)
        .await;

    // Ghana Card numbers have a fixed shape.
    let bad_card = app
        .request_authenticated(
            Method::POST,
            "/api/v1/farmers/verify/step/0",
            Some(json!({
                "full_name": "Ama Serwaa",
                "id_type": "ghana_card",
                "id_number": "12345"
            })),
            &token,
        )
        .await;
    assert_eq!(bad_card.status(), StatusCode::BAD_REQUEST);

    // A bank name without account details is incomplete.
    let bad_banking = app
        .request_authenticated(
            Method::POST,
            "/api/v1/farmers/verify/step/2",
            Some(json!({ "bank_name": "GCB Bank" })),
            &token,
        )
        .await;
    assert_eq!(bad_banking.status(), StatusCode::BAD_REQUEST);

    // Mandatory consents cannot be declined.
    let declined = app
        .request_authenticated(
            Method::POST,
            "/api/v1/farmers/verify/step/5",
            Some(json!({ "consent_terms": true, "consent_data_sharing": false })),
            &token,
        )
        .await;
    assert_eq!(declined.status(), StatusCode::BAD_REQUEST);

    // Step indices outside 0..=5 do not exist.
    let out_of_range = app
        .request_authenticated(
            Method::POST,
            "/api/v1/farmers/verify/step/9",
            Some(json!({})),
            &token,
        )
        .await;
    assert_eq!(out_of_range.status(), StatusCode::BAD_REQUEST);
}

// ==================== OTP Tests ====================

#[tokio::test]
async fn otp_requires_the_phone_step_first() {
    let app = TestApp::new().await;
    let (_, token) = app.unverified_farmer().await;
    app.request_authenticated(Method::POST, "/api/v1/farmers/verify/initiate", None, &token)
        .await;

    let response = app
        .request_authenticated(Method::POST, "/api/v1/farmers/verify/otp/send", None, &token)
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "VERIFICATION_STATE");
}

#[tokio::test]
async fn otp_round_trip_confirms_the_phone_once() {
    let app = TestApp::new().await;
    let (farmer, token) = app.unverified_farmer().await;
    app.request_authenticated(Method::POST, "/api/v1/farmers/verify/initiate", None, &token)
        .await;
    submit_step(&app, &token, 4).await;

    let sent = app
        .request_authenticated(Method::POST, "/api/v1/farmers/verify/otp/send", None, &token)
        .await;
    let sent_body = response_json(sent).await;
    assert_eq!(sent_body["data"]["phone"], "+233551234567");

    let code = latest_otp(&app, farmer.id).await.code;
    let verified = app
        .request_authenticated(
            Method::POST,
            "/api/v1/farmers/verify/otp/verify",
            Some(json!({ "code": code.clone() })),
            &token,
        )
        .await;
    assert_eq!(verified.status(), StatusCode::OK);
    let verified_body = response_json(verified).await;
    assert_eq!(verified_body["data"]["phone_verified"], true);

    // The code was consumed; replaying it finds nothing to check.
    let replayed = app
        .request_authenticated(
            Method::POST,
            "/api/v1/farmers/verify/otp/verify",
            Some(json!({ "code": code })),
            &token,
        )
        .await;
    assert_eq!(replayed.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let replayed_body = response_json(replayed).await;
    assert_eq!(replayed_body["error"]["code"], "VERIFICATION_STATE");
}

#[tokio::test]
async fn wrong_guesses_burn_the_code_after_three_attempts() {
    let app = TestApp::new().await;
    let (farmer, token) = app.unverified_farmer().await;
    app.request_authenticated(Method::POST, "/api/v1/farmers/verify/initiate", None, &token)
        .await;
    submit_step(&app, &token, 4).await;
    app.request_authenticated(Method::POST, "/api/v1/farmers/verify/otp/send", None, &token)
        .await;
    let code = latest_otp(&app, farmer.id).await.code;
    let wrong = if code == "000000" { "000001" } else { "000000" };

    for _ in 0..3 {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/farmers/verify/otp/verify",
                Some(json!({ "code": wrong })),
                &token,
            )
            .await;
        let body = response_json(response).await;
        assert_eq!(body["error"]["code"], "OTP_INVALID");
    }

    // Even the right code is refused once the attempts are spent.
    let exhausted = app
        .request_authenticated(
            Method::POST,
            "/api/v1/farmers/verify/otp/verify",
            Some(json!({ "code": code })),
            &token,
        )
        .await;
    assert_eq!(exhausted.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(exhausted).await;
    assert_eq!(body["error"]["code"], "OTP_MAX_ATTEMPTS");
}

#[tokio::test]
async fn expired_codes_are_rejected_before_checking() {
    let app = TestApp::new().await;
    let (farmer, token) = app.unverified_farmer().await;
    app.request_authenticated(Method::POST, "/api/v1/farmers/verify/initiate", None, &token)
        .await;
    submit_step(&app, &token, 4).await;
    app.request_authenticated(Method::POST, "/api/v1/farmers/verify/otp/send", None, &token)
        .await;

    let otp = latest_otp(&app, farmer.id).await;
    let code = otp.code.clone();
    let mut active: verification_otp::ActiveModel = otp.into();
    active.expires_at = Set(Utc::now() - Duration::seconds(1));
    active.update(&*app.state.db).await.expect("age the otp");

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/farmers/verify/otp/verify",
            Some(json!({ "code": code })),
            &token,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "OTP_EXPIRED");
}

// ==================== Submission and Review Tests ====================

#[tokio::test]
async fn submission_with_verified_phone_passes_level_one() {
    let app = TestApp::new().await;
    let (farmer, token) = app.unverified_farmer().await;
    complete_steps(&app, &token).await;
    confirm_phone(&app, &token, farmer.id).await;

    let response = app
        .request_authenticated(Method::POST, "/api/v1/farmers/verify/submit", None, &token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["level_1_status"], "approved");
    assert_eq!(body["data"]["id_check_passed"], true);
    assert_eq!(body["data"]["phone_check_passed"], true);
    assert!(!body["data"]["submitted_at"].is_null());

    // The account is parked for review and still cannot list produce.
    let me = app
        .request_authenticated(Method::GET, "/api/v1/auth/me", None, &token)
        .await;
    let me_body = response_json(me).await;
    assert_eq!(me_body["data"]["verification_status"], "pending");

    let listing = app
        .request_authenticated(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Fresh Cassava",
                "category": "tubers",
                "price": "4.00",
                "unit": "kg",
                "quantity_available": 100
            })),
            &token,
        )
        .await;
    assert_eq!(listing.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unverified_phone_fails_level_one_and_allows_retry() {
    let app = TestApp::new().await;
    let (farmer, token) = app.unverified_farmer().await;
    complete_steps(&app, &token).await;

    let rejected = app
        .request_authenticated(Method::POST, "/api/v1/farmers/verify/submit", None, &token)
        .await;
    let rejected_body = response_json(rejected).await;
    assert_eq!(rejected_body["data"]["level_1_status"], "rejected");
    assert_eq!(rejected_body["data"]["phone_check_passed"], false);

    let me = app
        .request_authenticated(Method::GET, "/api/v1/auth/me", None, &token)
        .await;
    let me_body = response_json(me).await;
    assert_eq!(me_body["data"]["verification_status"], "unverified");

    // Fixing the gap and resubmitting flips the verdict.
    confirm_phone(&app, &token, farmer.id).await;
    let retried = app
        .request_authenticated(Method::POST, "/api/v1/farmers/verify/submit", None, &token)
        .await;
    let retried_body = response_json(retried).await;
    assert_eq!(retried_body["data"]["level_1_status"], "approved");
}

#[tokio::test]
async fn admin_review_settles_the_application() {
    let app = TestApp::new().await;
    let (farmer, token) = app.unverified_farmer().await;
    let (_, admin_token) = app.admin().await;
    complete_steps(&app, &token).await;
    confirm_phone(&app, &token, farmer.id).await;
    app.request_authenticated(Method::POST, "/api/v1/farmers/verify/submit", None, &token)
        .await;

    // The application shows up in the admin queue.
    let queue = app
        .request_authenticated(Method::GET, "/api/v1/admin/verifications", None, &admin_token)
        .await;
    let queue_body = response_json(queue).await;
    assert_eq!(queue_body["data"]["total"], 1);
    let verification_id = queue_body["data"]["items"][0]["id"].as_str().unwrap().to_string();

    let decided = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/admin/verifications/{}/review", verification_id),
            Some(json!({ "approve": true, "notes": "Farm visit confirmed" })),
            &admin_token,
        )
        .await;
    assert_eq!(decided.status(), StatusCode::OK);
    let decided_body = response_json(decided).await;
    assert_eq!(decided_body["data"]["level_2_status"], "approved");
    assert_eq!(decided_body["data"]["review_notes"], "Farm visit confirmed");

    // The farmer is now fully verified and can list produce.
    let me = app
        .request_authenticated(Method::GET, "/api/v1/auth/me", None, &token)
        .await;
    let me_body = response_json(me).await;
    assert_eq!(me_body["data"]["verification_status"], "approved");

    let listing = app
        .request_authenticated(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Fresh Cassava",
                "category": "tubers",
                "price": "4.00",
                "unit": "kg",
                "quantity_available": 100
            })),
            &token,
        )
        .await;
    assert_eq!(listing.status(), StatusCode::CREATED);

    // A settled application cannot be reviewed twice.
    let again = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/admin/verifications/{}/review", verification_id),
            Some(json!({ "approve": false })),
            &admin_token,
        )
        .await;
    assert_eq!(again.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn review_requires_passed_automated_checks() {
    let app = TestApp::new().await;
    let (_, token) = app.unverified_farmer().await;
    let (_, admin_token) = app.admin().await;

    let initiated = app
        .request_authenticated(Method::POST, "/api/v1/farmers/verify/initiate", None, &token)
        .await;
    let verification_id = response_json(initiated).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/admin/verifications/{}/review", verification_id),
            Some(json!({ "approve": true })),
            &admin_token,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "VERIFICATION_STATE");
}
