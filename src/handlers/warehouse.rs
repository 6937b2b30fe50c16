use crate::{
    auth::{AuthRouterExt, AuthUser},
    common::{Paginated, PaginationParams},
    entities::{stock_movement, user::UserRole, warehouse},
    errors::ServiceError,
    handlers::common::{created_response, success_response, ApiResponse},
    services::warehouse::{
        CreateWarehouseInput, StockChangeInput, StockChangeReceipt, WarehouseInventoryView,
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

pub fn warehouse_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_warehouses).post(create_warehouse))
        .route("/:id/inventory", get(get_inventory))
        .route("/:id/inventory/add", post(add_inventory))
        .route("/:id/inventory/remove", post(remove_inventory))
        .route("/:id/movements", get(list_movements))
        .with_role(UserRole::Warehouse)
}

#[utoipa::path(
    get,
    path = "/api/v1/warehouses",
    responses(
        (status = 200, description = "All warehouses", body = ApiResponse<Vec<warehouse::Model>>),
        (status = 403, description = "Requires warehouse role", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Warehouse"
)]
pub async fn list_warehouses(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, ServiceError> {
    let warehouses = state.services.warehouse.list().await?;
    Ok(success_response(warehouses))
}

#[utoipa::path(
    post,
    path = "/api/v1/warehouses",
    request_body = CreateWarehouseInput,
    responses(
        (status = 201, description = "Warehouse created", body = ApiResponse<warehouse::Model>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Warehouse"
)]
pub async fn create_warehouse(
    _user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateWarehouseInput>,
) -> Result<Response, ServiceError> {
    let warehouse = state.services.warehouse.create(input).await?;
    Ok(created_response(warehouse))
}

#[utoipa::path(
    get,
    path = "/api/v1/warehouses/{id}/inventory",
    params(("id" = Uuid, Path, description = "Warehouse ID")),
    responses(
        (status = 200, description = "On-hand stock priced at live catalog prices", body = ApiResponse<WarehouseInventoryView>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Warehouse"
)]
pub async fn get_inventory(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let view = state.services.warehouse.get_inventory(id).await?;
    Ok(success_response(view))
}

#[utoipa::path(
    post,
    path = "/api/v1/warehouses/{id}/inventory/add",
    params(("id" = Uuid, Path, description = "Warehouse ID")),
    request_body = StockChangeInput,
    responses(
        (status = 200, description = "Receipt with the inbound ledger entry", body = ApiResponse<StockChangeReceipt>),
        (status = 404, description = "Warehouse or product not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Warehouse"
)]
pub async fn add_inventory(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<StockChangeInput>,
) -> Result<Response, ServiceError> {
    let receipt = state
        .services
        .warehouse
        .add_inventory(id, user.id, input)
        .await?;
    Ok(success_response(receipt))
}

#[utoipa::path(
    post,
    path = "/api/v1/warehouses/{id}/inventory/remove",
    params(("id" = Uuid, Path, description = "Warehouse ID")),
    request_body = StockChangeInput,
    responses(
        (status = 200, description = "Receipt with the outbound ledger entry", body = ApiResponse<StockChangeReceipt>),
        (status = 422, description = "On-hand stock does not cover the removal", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Warehouse"
)]
pub async fn remove_inventory(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<StockChangeInput>,
) -> Result<Response, ServiceError> {
    let receipt = state
        .services
        .warehouse
        .remove_inventory(id, user.id, input)
        .await?;
    Ok(success_response(receipt))
}

#[utoipa::path(
    get,
    path = "/api/v1/warehouses/{id}/movements",
    params(("id" = Uuid, Path, description = "Warehouse ID"), PaginationParams),
    responses(
        (status = 200, description = "Stock ledger, newest first", body = ApiResponse<Paginated<stock_movement::Model>>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Warehouse"
)]
pub async fn list_movements(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    let (page, limit) = pagination.clamp(
        state.config.api_default_page_size,
        state.config.api_max_page_size,
    );
    let movements = state
        .services
        .warehouse
        .list_movements(id, page, limit)
        .await?;
    Ok(success_response(movements))
}
