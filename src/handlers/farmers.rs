use crate::{
    auth::{AuthRouterExt, AuthUser},
    common::{Paginated, PaginationParams},
    entities::{farmer_verification, user::UserRole},
    errors::ServiceError,
    handlers::common::{success_response, ApiResponse},
    services::{
        orders::FarmerOrderLine,
        verification::{OtpIssued, VerifyOtpInput},
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};

pub fn farmer_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_farmer_orders))
        .route("/verify/initiate", post(initiate_verification))
        .route("/verify/status", get(verification_status))
        .route("/verify/step/:n", post(submit_verification_step))
        .route("/verify/otp/send", post(send_otp))
        .route("/verify/otp/verify", post(verify_otp))
        .route("/verify/submit", post(submit_verification))
        .with_role(UserRole::Farmer)
}

#[utoipa::path(
    get,
    path = "/api/v1/farmers/orders",
    params(PaginationParams),
    responses(
        (status = 200, description = "Order lines selling the farmer's produce", body = ApiResponse<Paginated<FarmerOrderLine>>),
        (status = 403, description = "Requires farmer role", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Farmers"
)]
pub async fn list_farmer_orders(
    user: AuthUser,
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    let (page, limit) = pagination.clamp(
        state.config.api_default_page_size,
        state.config.api_max_page_size,
    );
    let lines = state
        .services
        .orders
        .list_farmer_orders(user.id, page, limit)
        .await?;
    Ok(success_response(lines))
}

#[utoipa::path(
    post,
    path = "/api/v1/farmers/verify/initiate",
    responses(
        (status = 200, description = "Verification record, created or existing", body = ApiResponse<farmer_verification::Model>),
        (status = 403, description = "Requires farmer role", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Verification"
)]
pub async fn initiate_verification(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, ServiceError> {
    let record = state.services.verification.initiate(user.id).await?;
    Ok(success_response(record))
}

#[utoipa::path(
    get,
    path = "/api/v1/farmers/verify/status",
    responses(
        (status = 200, description = "Current verification state", body = ApiResponse<farmer_verification::Model>),
        (status = 404, description = "Not initiated yet", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Verification"
)]
pub async fn verification_status(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, ServiceError> {
    let record = state.services.verification.status(user.id).await?;
    Ok(success_response(record))
}

/// Step payloads differ per step, so the body arrives as raw JSON and
/// the service parses it against the right field group.
#[utoipa::path(
    post,
    path = "/api/v1/farmers/verify/step/{n}",
    params(("n" = i32, Path, description = "Step index, 0 through 5")),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Record after the step", body = ApiResponse<farmer_verification::Model>),
        (status = 400, description = "Invalid step payload", body = crate::errors::ErrorResponse),
        (status = 422, description = "Verification not in a submittable state", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Verification"
)]
pub async fn submit_verification_step(
    user: AuthUser,
    State(state): State<AppState>,
    Path(step): Path<i32>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Response, ServiceError> {
    let record = state
        .services
        .verification
        .submit_step(user.id, step, payload)
        .await?;
    Ok(success_response(record))
}

#[utoipa::path(
    post,
    path = "/api/v1/farmers/verify/otp/send",
    responses(
        (status = 200, description = "Code sent to the verification phone", body = ApiResponse<OtpIssued>),
        (status = 422, description = "No verification phone on record", body = crate::errors::ErrorResponse),
        (status = 429, description = "Too many codes requested", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Verification"
)]
pub async fn send_otp(user: AuthUser, State(state): State<AppState>) -> Result<Response, ServiceError> {
    let issued = state.services.verification.send_otp(user.id).await?;
    Ok(success_response(issued))
}

#[utoipa::path(
    post,
    path = "/api/v1/farmers/verify/otp/verify",
    request_body = VerifyOtpInput,
    responses(
        (status = 200, description = "Phone confirmed", body = ApiResponse<farmer_verification::Model>),
        (status = 422, description = "Wrong, expired or exhausted code", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Verification"
)]
pub async fn verify_otp(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<VerifyOtpInput>,
) -> Result<Response, ServiceError> {
    let record = state.services.verification.verify_otp(user.id, input).await?;
    Ok(success_response(record))
}

#[utoipa::path(
    post,
    path = "/api/v1/farmers/verify/submit",
    responses(
        (status = 200, description = "Submitted for review; automated checks recorded", body = ApiResponse<farmer_verification::Model>),
        (status = 400, description = "Required fields missing", body = crate::errors::ErrorResponse),
        (status = 422, description = "Already submitted", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Verification"
)]
pub async fn submit_verification(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, ServiceError> {
    let record = state.services.verification.submit(user.id).await?;
    Ok(success_response(record))
}
