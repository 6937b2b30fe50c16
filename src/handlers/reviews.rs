use crate::{
    auth::{AuthRouterExt, AuthUser},
    common::{Paginated, PaginationParams},
    entities::review,
    errors::ServiceError,
    handlers::common::{success_response, ApiResponse},
    services::reviews::ReviewInput,
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

/// Mounted inside the `/products` nest alongside the catalog routes.
pub fn review_routes() -> Router<AppState> {
    let protected = Router::new()
        .route("/:id/reviews", post(submit_review))
        .with_auth();

    Router::new()
        .route("/:id/reviews", get(list_reviews))
        .merge(protected)
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/reviews",
    params(("id" = Uuid, Path, description = "Product ID"), PaginationParams),
    responses(
        (status = 200, description = "Reviews, newest first", body = ApiResponse<Paginated<review::Model>>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    let (page, limit) = pagination.clamp(
        state.config.api_default_page_size,
        state.config.api_max_page_size,
    );
    let reviews = state
        .services
        .reviews
        .list_for_product(id, page, limit)
        .await?;
    Ok(success_response(reviews))
}

#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/reviews",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = ReviewInput,
    responses(
        (status = 200, description = "The saved review; a resubmission overwrites", body = ApiResponse<review::Model>),
        (status = 400, description = "Rating out of range", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Reviews"
)]
pub async fn submit_review(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ReviewInput>,
) -> Result<Response, ServiceError> {
    let review = state
        .services
        .reviews
        .upsert_review(user.id, id, input)
        .await?;
    Ok(success_response(review))
}
