use crate::{
    auth::{AuthRouterExt, AuthUser},
    common::{Paginated, PaginationParams},
    entities::{product, user::UserRole},
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response, ApiResponse},
    services::products::{CreateProductInput, ProductFilter, UpdateProductInput},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

pub fn product_routes() -> Router<AppState> {
    let farmer_only = Router::new()
        .route("/", axum::routing::post(create_product))
        .route(
            "/:id",
            axum::routing::put(update_product).delete(delete_product),
        )
        .with_role(UserRole::Farmer);

    Router::new()
        .route("/", get(list_products))
        .route("/slug/:slug", get(get_product_by_slug))
        .route("/:id", get(get_product))
        .merge(farmer_only)
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductFilter, PaginationParams),
    responses(
        (status = 200, description = "Active listings, newest first", body = ApiResponse<Paginated<product::Model>>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    let (page, limit) = pagination.clamp(
        state.config.api_default_page_size,
        state.config.api_max_page_size,
    );
    let products = state.services.products.list(filter, page, limit).await?;
    Ok(success_response(products))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product detail", body = ApiResponse<product::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let product = state.services.products.get(id).await?;
    Ok(success_response(product))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/slug/{slug}",
    params(("slug" = String, Path, description = "URL slug")),
    responses(
        (status = 200, description = "Product detail", body = ApiResponse<product::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ServiceError> {
    let product = state.services.products.get_by_slug(&slug).await?;
    Ok(success_response(product))
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductInput,
    responses(
        (status = 201, description = "Listing created", body = ApiResponse<product::Model>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 403, description = "Not a verified farmer", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn create_product(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateProductInput>,
) -> Result<Response, ServiceError> {
    let product = state.services.products.create(user.id, input).await?;
    Ok(created_response(product))
}

#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductInput,
    responses(
        (status = 200, description = "Listing updated", body = ApiResponse<product::Model>),
        (status = 403, description = "Owned by another farmer", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn update_product(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> Result<Response, ServiceError> {
    let product = state.services.products.update(user.id, id, input).await?;
    Ok(success_response(product))
}

#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Listing removed"),
        (status = 403, description = "Owned by another farmer", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.products.delete(user.id, id).await?;
    Ok(no_content_response())
}
