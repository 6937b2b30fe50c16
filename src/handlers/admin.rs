use crate::{
    auth::{AuthRouterExt, AuthUser},
    common::{Paginated, PaginationParams},
    entities::{farmer_verification, user, user::UserRole},
    errors::ServiceError,
    handlers::common::{success_response, ApiResponse},
    services::{
        admin::{Dashboard, SetActiveInput, UserFilter},
        verification::ReviewDecisionInput,
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/users", get(list_users))
        .route("/users/:id/active", put(set_user_active))
        .route("/verifications", get(list_pending_verifications))
        .route("/verifications/:id/review", post(review_verification))
        .with_role(UserRole::Admin)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard",
    responses(
        (status = 200, description = "Marketplace totals", body = ApiResponse<Dashboard>),
        (status = 403, description = "Requires admin role", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn dashboard(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, ServiceError> {
    let dashboard = state.services.admin.dashboard().await?;
    Ok(success_response(dashboard))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    params(UserFilter, PaginationParams),
    responses(
        (status = 200, description = "Accounts, newest first", body = ApiResponse<Paginated<user::Model>>)
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    let (page, limit) = pagination.clamp(
        state.config.api_default_page_size,
        state.config.api_max_page_size,
    );
    let users = state.services.admin.list_users(filter, page, limit).await?;
    Ok(success_response(users))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/active",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = SetActiveInput,
    responses(
        (status = 200, description = "Account after the change", body = ApiResponse<user::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn set_user_active(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SetActiveInput>,
) -> Result<Response, ServiceError> {
    let user = state.services.admin.set_user_active(id, input).await?;
    Ok(success_response(user))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/verifications",
    params(PaginationParams),
    responses(
        (status = 200, description = "Applications awaiting review, oldest first", body = ApiResponse<Paginated<farmer_verification::Model>>)
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn list_pending_verifications(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    let (page, limit) = pagination.clamp(
        state.config.api_default_page_size,
        state.config.api_max_page_size,
    );
    let queue = state
        .services
        .verification
        .pending_queue(page, limit)
        .await?;
    Ok(success_response(queue))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/verifications/{id}/review",
    params(("id" = Uuid, Path, description = "Verification record ID")),
    request_body = ReviewDecisionInput,
    responses(
        (status = 200, description = "Record after the decision", body = ApiResponse<farmer_verification::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Not reviewable in its current state", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn review_verification(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ReviewDecisionInput>,
) -> Result<Response, ServiceError> {
    let record = state
        .services
        .verification
        .review(user.id, id, input)
        .await?;
    Ok(success_response(record))
}
