use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Flat verification record accumulating the six onboarding steps. One per
/// farmer; step submissions overwrite their own field group and nothing else.
///
/// Level 1 is the automated outcome computed at submit time; level 2 is the
/// subsequent human review.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "farmer_verifications")]
#[schema(as = FarmerVerification)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    /// Highest step submitted so far plus one; advances monotonically
    pub current_step: i32,

    // Step 0: identity
    pub full_name: Option<String>,
    pub id_type: Option<String>,
    pub id_number: Option<String>,

    // Step 1: farm details
    pub farm_name: Option<String>,
    pub farm_region: Option<String>,
    pub farm_district: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub farm_size_acres: Option<Decimal>,
    pub primary_crops: Option<String>,

    // Step 2: banking
    pub bank_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_account_name: Option<String>,
    pub mobile_money_number: Option<String>,

    // Step 3: documents
    pub id_front_url: Option<String>,
    pub id_back_url: Option<String>,
    pub selfie_url: Option<String>,
    pub farm_photo_url: Option<String>,

    // Step 4: phone verification
    pub verification_phone: Option<String>,
    pub phone_verified: bool,

    // Step 5: compliance consents
    pub consent_terms: bool,
    pub consent_data_sharing: bool,
    pub consent_farm_visit: bool,

    // Automated (level 1) outcome
    pub level_1_status: LevelStatus,
    pub id_check_passed: Option<bool>,
    pub phone_check_passed: Option<bool>,
    pub submitted_at: Option<DateTime<Utc>>,

    // Human (level 2) review
    pub level_2_status: LevelStatus,
    pub reviewer_id: Option<Uuid>,
    #[sea_orm(column_type = "Text", nullable)]
    pub review_notes: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,

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

/// Number of submission steps in the verification flow (0 through 5)
pub const VERIFICATION_STEPS: i32 = 6;

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
pub enum LevelStatus {
    #[sea_orm(string_value = "not_started")]
    NotStarted,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}
