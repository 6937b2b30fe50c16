use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Farmer-specific profile, one per farmer account. Carries the denormalized
/// rating and sales counters recomputed whenever a review or order lands.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "farmer_profiles")]
#[schema(as = FarmerProfile)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub farm_name: Option<String>,
    pub region: Option<String>,
    pub bio: Option<String>,
    /// Average across all reviews of this farmer's products
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub rating: Decimal,
    pub rating_count: i32,
    /// Units sold across all products; decremented (floored at zero) on cancellation
    pub total_sales: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
