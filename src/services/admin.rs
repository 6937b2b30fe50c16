use crate::{
    common::Paginated,
    entities::{
        order::{self, PaymentStatus},
        product, review,
        user::{self, UserRole, VerificationStatus},
        warehouse,
    },
    errors::ServiceError,
    events::EventSender,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilter {
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetActiveInput {
    pub active: bool,
}

/// Marketplace-wide counters for the admin landing page.
#[derive(Debug, Serialize, ToSchema)]
pub struct Dashboard {
    pub users: u64,
    pub farmers: u64,
    pub buyers: u64,
    pub products: u64,
    pub orders: u64,
    pub reviews: u64,
    pub warehouses: u64,
    pub pending_verifications: u64,
    /// Sum of `total_amount` over orders whose payment is settled
    pub revenue: Decimal,
    pub currency: String,
}

/// Moderation surface: the dashboard summary, user listing and account
/// soft delete / restore.
pub struct AdminService {
    db: Arc<DatabaseConnection>,
    #[allow(dead_code)]
    event_sender: Arc<EventSender>,
    currency: String,
}

impl AdminService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        currency: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            currency,
        }
    }

    /// Entity counts plus revenue over paid orders. Counts include
    /// soft-deleted rows; the point is volume, not moderation state.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<Dashboard, ServiceError> {
        let users = user::Entity::find().count(&*self.db).await?;
        let farmers = user::Entity::find()
            .filter(user::Column::Role.eq(UserRole::Farmer))
            .count(&*self.db)
            .await?;
        let buyers = user::Entity::find()
            .filter(user::Column::Role.eq(UserRole::Buyer))
            .count(&*self.db)
            .await?;
        let products = product::Entity::find()
            .filter(product::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        let orders = order::Entity::find().count(&*self.db).await?;
        let reviews = review::Entity::find().count(&*self.db).await?;
        let warehouses = warehouse::Entity::find().count(&*self.db).await?;
        let pending_verifications = user::Entity::find()
            .filter(user::Column::VerificationStatus.eq(VerificationStatus::Pending))
            .count(&*self.db)
            .await?;

        let paid_totals: Vec<Decimal> = order::Entity::find()
            .select_only()
            .column(order::Column::TotalAmount)
            .filter(order::Column::PaymentStatus.eq(PaymentStatus::Paid))
            .into_tuple()
            .all(&*self.db)
            .await?;
        let revenue: Decimal = paid_totals.into_iter().sum();

        Ok(Dashboard {
            users,
            farmers,
            buyers,
            products,
            orders,
            reviews,
            warehouses,
            pending_verifications,
            revenue: revenue.round_dp(2),
            currency: self.currency.clone(),
        })
    }

    /// All accounts, optionally narrowed to one role, newest first.
    /// Soft-deleted accounts are included so they can be restored.
    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        filter: UserFilter,
        page: u64,
        limit: u64,
    ) -> Result<Paginated<user::Model>, ServiceError> {
        let mut query = user::Entity::find().order_by_desc(user::Column::CreatedAt);
        if let Some(role) = filter.role {
            query = query.filter(user::Column::Role.eq(role));
        }
        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;
        Ok(Paginated::new(items, page, limit, total))
    }

    /// Soft-deletes or restores an account. A deactivated user cannot log
    /// in and their listings drop out of the catalog by the soft-delete
    /// filters; restoring reverses both.
    #[instrument(skip(self))]
    pub async fn set_user_active(
        &self,
        user_id: Uuid,
        input: SetActiveInput,
    ) -> Result<user::Model, ServiceError> {
        let found = user::Entity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {}", user_id)))?;

        let already_active = found.deleted_at.is_none();
        if already_active == input.active {
            return Ok(found);
        }

        let now = Utc::now();
        let mut active: user::ActiveModel = found.into();
        active.deleted_at = Set(if input.active { None } else { Some(now) });
        active.updated_at = Set(Some(now));
        let updated = active.update(&*self.db).await?;
        info!(user_id = %user_id, active = input.active, "Account active flag changed");
        Ok(updated)
    }
}
