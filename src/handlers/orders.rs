use crate::{
    auth::{AuthRouterExt, AuthUser},
    common::{Paginated, PaginationParams},
    entities::{order, order_tracking, user::UserRole},
    errors::ServiceError,
    handlers::common::{created_response, success_response, ApiResponse},
    services::orders::{CreateOrderInput, OrderDetails, UpdateOrderStatusInput},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

pub fn order_routes() -> Router<AppState> {
    let delivery_only = Router::new()
        .route("/:id/status", put(update_order_status))
        .with_role(UserRole::Delivery);

    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/cancel", post(cancel_order))
        .route("/:id/tracking", get(get_tracking))
        .with_auth()
        .merge(delivery_only)
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderInput,
    responses(
        (status = 201, description = "Order placed from the cart", body = ApiResponse<OrderDetails>),
        (status = 422, description = "Empty cart, bad address or not enough stock", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateOrderInput>,
) -> Result<Response, ServiceError> {
    let order = state.services.orders.create_order(user.id, input).await?;
    Ok(created_response(order))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(PaginationParams),
    responses(
        (status = 200, description = "The caller's orders, newest first", body = ApiResponse<Paginated<order::Model>>)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    user: AuthUser,
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    let (page, limit) = pagination.clamp(
        state.config.api_default_page_size,
        state.config.api_max_page_size,
    );
    let orders = state.services.orders.list_orders(user.id, page, limit).await?;
    Ok(success_response(orders))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with its lines", body = ApiResponse<OrderDetails>),
        (status = 404, description = "Not found or not yours", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let order = state
        .services
        .orders
        .get_order(id, user.id, user.is_admin())
        .await?;
    Ok(success_response(order))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Cancelled order; stock restored", body = ApiResponse<OrderDetails>),
        (status = 404, description = "Not found or not yours", body = crate::errors::ErrorResponse),
        (status = 422, description = "Already in fulfilment", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let order = state.services.orders.cancel_order(user.id, id).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusInput,
    responses(
        (status = 200, description = "Order after the transition", body = ApiResponse<order::Model>),
        (status = 403, description = "Requires delivery or admin role", body = crate::errors::ErrorResponse),
        (status = 422, description = "Illegal transition", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn update_order_status(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateOrderStatusInput>,
) -> Result<Response, ServiceError> {
    let order = state.services.orders.update_status(id, input).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/tracking",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Status history, oldest first", body = ApiResponse<Vec<order_tracking::Model>>),
        (status = 404, description = "Not found or not yours", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn get_tracking(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let tracking = state
        .services
        .orders
        .get_tracking(id, user.id, user.is_admin())
        .await?;
    Ok(success_response(tracking))
}
