use crate::{common::Paginated, entities::notification, errors::ServiceError};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Notification list plus the unread count clients show as a badge.
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationPage {
    #[serde(flatten)]
    pub page: Paginated<notification::Model>,
    pub unread: u64,
}

/// Writes one notification row inside the caller's transaction, so the
/// notification exists exactly when the state change that caused it does.
pub async fn record<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    title: &str,
    body: String,
) -> Result<notification::Model, ServiceError> {
    let row = notification::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        title: Set(title.to_string()),
        body: Set(body),
        read_at: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?;
    Ok(row)
}

/// Read-side of in-app notifications. Rows are produced by the order,
/// payment and verification flows via [`record`].
pub struct NotificationService {
    db: Arc<DatabaseConnection>,
}

impl NotificationService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Newest first, with the total unread count alongside.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        user_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<NotificationPage, ServiceError> {
        let paginator = notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;

        let unread = notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::ReadAt.is_null())
            .count(&*self.db)
            .await?;

        Ok(NotificationPage {
            page: Paginated::new(items, page, limit, total),
            unread,
        })
    }

    /// Marks one notification read. Re-reading is a no-op.
    #[instrument(skip(self))]
    pub async fn mark_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<notification::Model, ServiceError> {
        let found = notification::Entity::find_by_id(notification_id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Notification {}", notification_id)))?;

        if found.read_at.is_some() {
            return Ok(found);
        }
        let mut active: notification::ActiveModel = found.into();
        active.read_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db).await?)
    }

    /// Marks everything unread as read; returns how many rows changed.
    #[instrument(skip(self))]
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        use sea_orm::sea_query::Expr;

        let res = notification::Entity::update_many()
            .col_expr(notification::Column::ReadAt, Expr::value(Utc::now()))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::ReadAt.is_null())
            .exec(&*self.db)
            .await?;
        info!(user_id = %user_id, marked = res.rows_affected, "Notifications marked read");
        Ok(res.rows_affected)
    }
}
