use crate::{
    auth::{AuthRouterExt, AuthUser},
    common::PaginationParams,
    entities::notification,
    errors::ServiceError,
    handlers::common::{success_response, ApiResponse},
    services::notifications::NotificationPage,
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadAllAck {
    marked: u64,
}

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/:id/read", post(mark_read))
        .route("/read-all", post(mark_all_read))
        .with_auth()
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(PaginationParams),
    responses(
        (status = 200, description = "Notifications, newest first, with unread count", body = ApiResponse<NotificationPage>)
    ),
    security(("Bearer" = [])),
    tag = "Notifications"
)]
pub async fn list_notifications(
    user: AuthUser,
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    let (page, limit) = pagination.clamp(
        state.config.api_default_page_size,
        state.config.api_max_page_size,
    );
    let notifications = state
        .services
        .notifications
        .list(user.id, page, limit)
        .await?;
    Ok(success_response(notifications))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "The notification, marked read", body = ApiResponse<notification::Model>),
        (status = 404, description = "Not found or not yours", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Notifications"
)]
pub async fn mark_read(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let notification = state.services.notifications.mark_read(user.id, id).await?;
    Ok(success_response(notification))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    responses(
        (status = 200, description = "Count of notifications marked read", body = ApiResponse<ReadAllAck>)
    ),
    security(("Bearer" = [])),
    tag = "Notifications"
)]
pub async fn mark_all_read(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, ServiceError> {
    let marked = state.services.notifications.mark_all_read(user.id).await?;
    Ok(success_response(ReadAllAck { marked }))
}
