use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::{payment_transaction, user::UserRole},
    errors::ServiceError,
    handlers::common::{success_response, ApiResponse},
    services::payments::{CallbackAck, CallbackPayload, InitiatePaymentInput},
    AppState,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

pub fn payment_routes() -> Router<AppState> {
    let authed = Router::new()
        .route("/initiate", post(initiate_payment))
        .route("/orders/:id", get(list_order_payments))
        .with_auth();

    let admin_only = Router::new()
        .route("/orders/:id/refund", post(refund_payment))
        .with_role(UserRole::Admin);

    // The callback authenticates with an HMAC signature, not a bearer
    // token, so it stays outside the auth layers.
    Router::new()
        .route("/callback", post(payment_callback))
        .merge(authed)
        .merge(admin_only)
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/initiate",
    request_body = InitiatePaymentInput,
    responses(
        (status = 200, description = "Payment attempt started", body = ApiResponse<payment_transaction::Model>),
        (status = 404, description = "Order not found or not yours", body = crate::errors::ErrorResponse),
        (status = 422, description = "Order is not payable", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Payments"
)]
pub async fn initiate_payment(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<InitiatePaymentInput>,
) -> Result<Response, ServiceError> {
    let transaction = state.services.payments.initiate(user.id, input).await?;
    Ok(success_response(transaction))
}

/// Gateway callback. Signature verification happens against the raw
/// bytes, so the body is taken unparsed.
#[utoipa::path(
    post,
    path = "/api/v1/payments/callback",
    request_body = CallbackPayload,
    responses(
        (status = 200, description = "Callback applied or replay acknowledged", body = ApiResponse<CallbackAck>),
        (status = 401, description = "Bad or missing signature", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown provider reference", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn payment_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ServiceError> {
    let signature = headers.get("x-signature").and_then(|v| v.to_str().ok());
    let timestamp = headers.get("x-timestamp").and_then(|v| v.to_str().ok());
    let ack = state
        .services
        .payments
        .handle_callback(&body, signature, timestamp)
        .await?;
    Ok(success_response(ack))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Payment attempts for the order, newest first", body = ApiResponse<Vec<payment_transaction::Model>>),
        (status = 404, description = "Order not found or not yours", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Payments"
)]
pub async fn list_order_payments(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let transactions = state
        .services
        .payments
        .list_for_order(id, user.id, user.is_admin())
        .await?;
    Ok(success_response(transactions))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/orders/{id}/refund",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Compensating refund transaction", body = ApiResponse<payment_transaction::Model>),
        (status = 403, description = "Requires admin role", body = crate::errors::ErrorResponse),
        (status = 422, description = "Order is not refundable", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Payments"
)]
pub async fn refund_payment(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let transaction = state.services.payments.refund(id).await?;
    Ok(success_response(transaction))
}
