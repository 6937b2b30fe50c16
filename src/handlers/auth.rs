use crate::{
    auth::{AuthRouterExt, AuthUser, IssuedToken},
    entities::user,
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response, ApiResponse},
    services::accounts::{
        ChangePasswordInput, LoginInput, NewAddressInput, Profile, RegisterInput,
        UpdateProfileInput,
    },
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Token plus the account it belongs to, returned by register and login.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthSession {
    #[serde(flatten)]
    pub token: IssuedToken,
    pub user: user::Model,
}

pub fn auth_routes() -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(me).put(update_me))
        .route("/change-password", post(change_password))
        .route("/addresses", get(list_addresses).post(add_address))
        .route("/addresses/:id", delete(remove_address))
        .with_auth();

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterInput,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<AuthSession>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<Response, ServiceError> {
    let user = state.services.accounts.register(input).await?;
    let token = state.auth.issue_token(&user)?;
    Ok(created_response(AuthSession { token, user }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginInput,
    responses(
        (status = 200, description = "Authenticated", body = ApiResponse<AuthSession>),
        (status = 401, description = "Bad credentials", body = crate::errors::ErrorResponse),
        (status = 429, description = "Account locked", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Response, ServiceError> {
    let user = state.services.accounts.login(input).await?;
    let token = state.auth.issue_token(&user)?;
    Ok(success_response(AuthSession { token, user }))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current profile", body = ApiResponse<Profile>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Auth"
)]
pub async fn me(user: AuthUser, State(state): State<AppState>) -> Result<Response, ServiceError> {
    let profile = state.services.accounts.get_profile(user.id).await?;
    Ok(success_response(profile))
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/me",
    request_body = UpdateProfileInput,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<Profile>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Auth"
)]
pub async fn update_me(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfileInput>,
) -> Result<Response, ServiceError> {
    let profile = state
        .services
        .accounts
        .update_profile(user.id, input)
        .await?;
    Ok(success_response(profile))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/change-password",
    request_body = ChangePasswordInput,
    responses(
        (status = 204, description = "Password changed"),
        (status = 401, description = "Current password wrong", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Auth"
)]
pub async fn change_password(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ChangePasswordInput>,
) -> Result<Response, ServiceError> {
    state
        .services
        .accounts
        .change_password(user.id, input)
        .await?;
    Ok(no_content_response())
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/addresses",
    responses(
        (status = 200, description = "Active delivery addresses", body = ApiResponse<Vec<crate::entities::address::Model>>)
    ),
    security(("Bearer" = [])),
    tag = "Auth"
)]
pub async fn list_addresses(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, ServiceError> {
    let addresses = state.services.accounts.list_addresses(user.id).await?;
    Ok(success_response(addresses))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/addresses",
    request_body = NewAddressInput,
    responses(
        (status = 201, description = "Address added", body = ApiResponse<crate::entities::address::Model>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Auth"
)]
pub async fn add_address(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<NewAddressInput>,
) -> Result<Response, ServiceError> {
    let address = state.services.accounts.add_address(user.id, input).await?;
    Ok(created_response(address))
}

#[utoipa::path(
    delete,
    path = "/api/v1/auth/addresses/{id}",
    params(("id" = Uuid, Path, description = "Address ID")),
    responses(
        (status = 204, description = "Address deactivated"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Auth"
)]
pub async fn remove_address(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .services
        .accounts
        .deactivate_address(user.id, id)
        .await?;
    Ok(no_content_response())
}
