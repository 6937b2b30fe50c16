use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_users_tables::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FarmerVerifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FarmerVerifications::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::UserId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::CurrentStep)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::FullName)
                            .string()
                            .null(),
                    )
                    .col(ColumnDef::new(FarmerVerifications::IdType).string().null())
                    .col(
                        ColumnDef::new(FarmerVerifications::IdNumber)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::FarmName)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::FarmRegion)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::FarmDistrict)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::FarmSizeAcres)
                            .decimal_len(19, 4)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::PrimaryCrops)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::BankName)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::BankAccountNumber)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::BankAccountName)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::MobileMoneyNumber)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::IdFrontUrl)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::IdBackUrl)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::SelfieUrl)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::FarmPhotoUrl)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::VerificationPhone)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::PhoneVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::ConsentTerms)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::ConsentDataSharing)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::ConsentFarmVisit)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::Level1Status)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::IdCheckPassed)
                            .boolean()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::PhoneCheckPassed)
                            .boolean()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::SubmittedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::Level2Status)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::ReviewerId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::ReviewNotes)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::ReviewedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FarmerVerifications::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_farmer_verifications_user_id")
                            .from(FarmerVerifications::Table, FarmerVerifications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The admin review queue filters on this column
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_farmer_verifications_level_2_status")
                    .table(FarmerVerifications::Table)
                    .col(FarmerVerifications::Level2Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VerificationOtps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VerificationOtps::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VerificationOtps::UserId).uuid().not_null())
                    .col(ColumnDef::new(VerificationOtps::Phone).string().not_null())
                    .col(ColumnDef::new(VerificationOtps::Code).string().not_null())
                    .col(
                        ColumnDef::new(VerificationOtps::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VerificationOtps::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VerificationOtps::MaxAttempts)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VerificationOtps::ConsumedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(VerificationOtps::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_verification_otps_user_id")
                            .from(VerificationOtps::Table, VerificationOtps::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_verification_otps_user_id")
                    .table(VerificationOtps::Table)
                    .col(VerificationOtps::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VerificationOtps::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FarmerVerifications::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FarmerVerifications {
    Table,
    Id,
    UserId,
    CurrentStep,
    FullName,
    IdType,
    IdNumber,
    FarmName,
    FarmRegion,
    FarmDistrict,
    FarmSizeAcres,
    PrimaryCrops,
    BankName,
    BankAccountNumber,
    BankAccountName,
    MobileMoneyNumber,
    IdFrontUrl,
    IdBackUrl,
    SelfieUrl,
    FarmPhotoUrl,
    VerificationPhone,
    PhoneVerified,
    ConsentTerms,
    ConsentDataSharing,
    ConsentFarmVisit,
    Level1Status,
    IdCheckPassed,
    PhoneCheckPassed,
    SubmittedAt,
    Level2Status,
    ReviewerId,
    ReviewNotes,
    ReviewedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum VerificationOtps {
    Table,
    Id,
    UserId,
    Phone,
    Code,
    ExpiresAt,
    Attempts,
    MaxAttempts,
    ConsumedAt,
    CreatedAt,
}
