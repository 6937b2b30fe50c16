use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A farmer's listing. `quantity_available` is only ever mutated through
/// order placement/cancellation and explicit restock, and never goes negative.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "products")]
#[schema(as = Product)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owning farmer's user id
    pub farmer_id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub category: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub price: Decimal,
    pub unit: ProductUnit,
    pub quantity_available: i32,
    pub sold_count: i32,
    /// Average across stored reviews, recomputed on every review write
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub rating: Decimal,
    pub rating_count: i32,
    pub image_url: Option<String>,
    pub is_active: bool,
    /// Soft delete marker; set rows vanish from listings and the cart
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FarmerId",
        to = "super::user::Column::Id"
    )]
    Farmer,
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Farmer.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Listable means visible to buyers and addable to carts.
    pub fn is_listable(&self) -> bool {
        self.is_active && self.deleted_at.is_none()
    }
}

/// Unit of sale for produce
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductUnit {
    #[sea_orm(string_value = "kg")]
    Kg,
    #[sea_orm(string_value = "bag")]
    Bag,
    #[sea_orm(string_value = "crate")]
    Crate,
    #[sea_orm(string_value = "box")]
    Box,
    #[sea_orm(string_value = "piece")]
    Piece,
    #[sea_orm(string_value = "bunch")]
    Bunch,
    #[sea_orm(string_value = "litre")]
    Litre,
}
