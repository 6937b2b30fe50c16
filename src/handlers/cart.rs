use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::ServiceError,
    handlers::common::{success_response, ApiResponse},
    services::cart::{AddToCartInput, CartValidation, CartView, UpdateCartItemInput},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/items", post(add_item))
        .route("/items/:id", put(update_item).delete(remove_item))
        .route("/clear", post(clear_cart))
        .route("/validate", get(validate_cart))
        .with_auth()
}

#[utoipa::path(
    get,
    path = "/api/v1/cart",
    responses(
        (status = 200, description = "The caller's cart", body = ApiResponse<CartView>)
    ),
    security(("Bearer" = [])),
    tag = "Cart"
)]
pub async fn get_cart(user: AuthUser, State(state): State<AppState>) -> Result<Response, ServiceError> {
    let cart = state.services.cart.get_cart(user.id).await?;
    Ok(success_response(cart))
}

#[utoipa::path(
    post,
    path = "/api/v1/cart/items",
    request_body = AddToCartInput,
    responses(
        (status = 200, description = "Cart after the add", body = ApiResponse<CartView>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Not enough stock", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Cart"
)]
pub async fn add_item(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<AddToCartInput>,
) -> Result<Response, ServiceError> {
    let cart = state.services.cart.add_item(user.id, input).await?;
    Ok(success_response(cart))
}

#[utoipa::path(
    put,
    path = "/api/v1/cart/items/{id}",
    params(("id" = Uuid, Path, description = "Cart item ID")),
    request_body = UpdateCartItemInput,
    responses(
        (status = 200, description = "Cart after the change", body = ApiResponse<CartView>),
        (status = 404, description = "Item not in cart", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Cart"
)]
pub async fn update_item(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCartItemInput>,
) -> Result<Response, ServiceError> {
    let cart = state
        .services
        .cart
        .update_item_quantity(user.id, id, input)
        .await?;
    Ok(success_response(cart))
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart/items/{id}",
    params(("id" = Uuid, Path, description = "Cart item ID")),
    responses(
        (status = 200, description = "Cart after the removal", body = ApiResponse<CartView>),
        (status = 404, description = "Item not in cart", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Cart"
)]
pub async fn remove_item(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let cart = state.services.cart.remove_item(user.id, id).await?;
    Ok(success_response(cart))
}

#[utoipa::path(
    post,
    path = "/api/v1/cart/clear",
    responses(
        (status = 200, description = "The emptied cart", body = ApiResponse<CartView>)
    ),
    security(("Bearer" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, ServiceError> {
    let cart = state.services.cart.clear(user.id).await?;
    Ok(success_response(cart))
}

#[utoipa::path(
    get,
    path = "/api/v1/cart/validate",
    responses(
        (status = 200, description = "Line-by-line stock and price check", body = ApiResponse<CartValidation>)
    ),
    security(("Bearer" = [])),
    tag = "Cart"
)]
pub async fn validate_cart(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, ServiceError> {
    let validation = state.services.cart.validate_cart(user.id).await?;
    Ok(success_response(validation))
}
