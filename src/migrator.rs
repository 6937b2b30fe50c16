use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users_tables::Migration),
            Box::new(m20250101_000002_create_products_table::Migration),
            Box::new(m20250101_000003_create_carts_tables::Migration),
            Box::new(m20250101_000004_create_orders_tables::Migration),
            Box::new(m20250101_000005_create_verification_tables::Migration),
            Box::new(m20250101_000006_create_warehouse_tables::Migration),
            Box::new(m20250101_000007_create_reviews_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20250101_000001_create_users_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_users_tables"
        }
    }

    #[async_trait::async_trait]
    // SchemaManager must stay elided here: async_trait makes an explicit
    // lifetime early-bound, which no longer matches the trait (E0195).
    #[allow(elided_lifetimes_in_paths)]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create users table aligned with entities::user Model
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Users::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::Phone).string().not_null())
                        .col(ColumnDef::new(Users::FullName).string().not_null())
                        .col(ColumnDef::new(Users::PasswordHash).text().not_null())
                        .col(ColumnDef::new(Users::Role).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Users::VerificationStatus)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::FailedLoginAttempts)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Users::LockedUntil)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Users::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_phone")
                        .table(Users::Table)
                        .col(Users::Phone)
                        .to_owned(),
                )
                .await?;

            // Create farmer_profiles table aligned with entities::farmer_profile Model
            manager
                .create_table(
                    Table::create()
                        .table(FarmerProfiles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FarmerProfiles::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FarmerProfiles::UserId)
                                .uuid()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(FarmerProfiles::FarmName).string().null())
                        .col(ColumnDef::new(FarmerProfiles::Region).string().null())
                        .col(ColumnDef::new(FarmerProfiles::Bio).string().null())
                        .col(
                            ColumnDef::new(FarmerProfiles::Rating)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(FarmerProfiles::RatingCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(FarmerProfiles::TotalSales)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(FarmerProfiles::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FarmerProfiles::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_farmer_profiles_user_id")
                                .from(FarmerProfiles::Table, FarmerProfiles::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // Create addresses table aligned with entities::address Model
            manager
                .create_table(
                    Table::create()
                        .table(Addresses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Addresses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Addresses::UserId).uuid().not_null())
                        .col(ColumnDef::new(Addresses::Label).string().not_null())
                        .col(ColumnDef::new(Addresses::Region).string().not_null())
                        .col(ColumnDef::new(Addresses::City).string().not_null())
                        .col(ColumnDef::new(Addresses::Street).string().not_null())
                        .col(ColumnDef::new(Addresses::Details).string().null())
                        .col(ColumnDef::new(Addresses::ContactPhone).string().not_null())
                        .col(
                            ColumnDef::new(Addresses::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Addresses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Addresses::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_addresses_user_id")
                                .from(Addresses::Table, Addresses::UserId)
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
                        .name("idx_addresses_user_id")
                        .table(Addresses::Table)
                        .col(Addresses::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Addresses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(FarmerProfiles::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Users {
        Table,
        Id,
        Email,
        Phone,
        FullName,
        PasswordHash,
        Role,
        VerificationStatus,
        FailedLoginAttempts,
        LockedUntil,
        DeletedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum FarmerProfiles {
        Table,
        Id,
        UserId,
        FarmName,
        Region,
        Bio,
        Rating,
        RatingCount,
        TotalSales,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Addresses {
        Table,
        Id,
        UserId,
        Label,
        Region,
        City,
        Street,
        Details,
        ContactPhone,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250101_000002_create_products_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_products_table"
        }
    }

    #[async_trait::async_trait]
    // SchemaManager must stay elided here: async_trait makes an explicit
    // lifetime early-bound, which no longer matches the trait (E0195).
    #[allow(elided_lifetimes_in_paths)]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create products table aligned with entities::product Model
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::FarmerId).uuid().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(
                            ColumnDef::new(Products::Slug)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Category).string().not_null())
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(
                            ColumnDef::new(Products::Price)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::Unit).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Products::QuantityAvailable)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::SoldCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::Rating)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::RatingCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::ImageUrl).string().null())
                        .col(
                            ColumnDef::new(Products::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Products::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_farmer_id")
                                .from(Products::Table, Products::FarmerId)
                                .to(
                                    super::m20250101_000001_create_users_tables::Users::Table,
                                    super::m20250101_000001_create_users_tables::Users::Id,
                                )
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_farmer_id")
                        .table(Products::Table)
                        .col(Products::FarmerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_category")
                        .table(Products::Table)
                        .col(Products::Category)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_is_active")
                        .table(Products::Table)
                        .col(Products::IsActive)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        FarmerId,
        Name,
        Slug,
        Category,
        Description,
        Price,
        Unit,
        QuantityAvailable,
        SoldCount,
        Rating,
        RatingCount,
        ImageUrl,
        IsActive,
        DeletedAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250101_000003_create_carts_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_carts_tables"
        }
    }

    #[async_trait::async_trait]
    // SchemaManager must stay elided here: async_trait makes an explicit
    // lifetime early-bound, which no longer matches the trait (E0195).
    #[allow(elided_lifetimes_in_paths)]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create carts table aligned with entities::cart Model
            manager
                .create_table(
                    Table::create()
                        .table(Carts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Carts::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Carts::UserId)
                                .uuid()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Carts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Carts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_carts_user_id")
                                .from(Carts::Table, Carts::UserId)
                                .to(
                                    super::m20250101_000001_create_users_tables::Users::Table,
                                    super::m20250101_000001_create_users_tables::Users::Id,
                                )
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // Create cart_items table aligned with entities::cart_item Model
            manager
                .create_table(
                    Table::create()
                        .table(CartItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CartItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CartItems::CartId).uuid().not_null())
                        .col(ColumnDef::new(CartItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(CartItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(CartItems::UnitPrice)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CartItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CartItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_cart_items_cart_id")
                                .from(CartItems::Table, CartItems::CartId)
                                .to(Carts::Table, Carts::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_cart_items_product_id")
                                .from(CartItems::Table, CartItems::ProductId)
                                .to(
                                    super::m20250101_000002_create_products_table::Products::Table,
                                    super::m20250101_000002_create_products_table::Products::Id,
                                )
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // One row per product per cart
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_cart_items_cart_id_product_id")
                        .table(CartItems::Table)
                        .col(CartItems::CartId)
                        .col(CartItems::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CartItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Carts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Carts {
        Table,
        Id,
        UserId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum CartItems {
        Table,
        Id,
        CartId,
        ProductId,
        Quantity,
        UnitPrice,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250101_000004_create_orders_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000004_create_orders_tables"
        }
    }

    #[async_trait::async_trait]
    // SchemaManager must stay elided here: async_trait makes an explicit
    // lifetime early-bound, which no longer matches the trait (E0195).
    #[allow(elided_lifetimes_in_paths)]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create orders table aligned with entities::order Model
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Orders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Orders::UserId).uuid().not_null())
                        .col(ColumnDef::new(Orders::Status).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Orders::PaymentStatus)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::PaymentMethod)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::DeliveryRegion).string().not_null())
                        .col(ColumnDef::new(Orders::DeliveryCity).string().not_null())
                        .col(ColumnDef::new(Orders::DeliveryStreet).string().not_null())
                        .col(ColumnDef::new(Orders::DeliveryDetails).string().null())
                        .col(ColumnDef::new(Orders::ContactPhone).string().not_null())
                        .col(
                            ColumnDef::new(Orders::Subtotal)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::DeliveryFee)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::Currency).string().not_null())
                        .col(
                            ColumnDef::new(Orders::PaidAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::CancelledAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_user_id")
                                .from(Orders::Table, Orders::UserId)
                                .to(
                                    super::m20250101_000001_create_users_tables::Users::Table,
                                    super::m20250101_000001_create_users_tables::Users::Id,
                                )
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_user_id")
                        .table(Orders::Table)
                        .col(Orders::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_created_at")
                        .table(Orders::Table)
                        .col(Orders::CreatedAt)
                        .to_owned(),
                )
                .await?;

            // Create order_items table aligned with entities::order_item Model.
            // Product fields are denormalized so order history survives
            // catalog changes; product_id is deliberately not a foreign key.
            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::FarmerId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductName).string().not_null())
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(OrderItems::UnitPrice)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::LineTotal)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order_id")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_farmer_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::FarmerId)
                        .to_owned(),
                )
                .await?;

            // Create order_tracking table aligned with entities::order_tracking Model
            manager
                .create_table(
                    Table::create()
                        .table(OrderTracking::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderTracking::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderTracking::OrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(OrderTracking::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderTracking::Note).string().null())
                        .col(
                            ColumnDef::new(OrderTracking::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_tracking_order_id")
                                .from(OrderTracking::Table, OrderTracking::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_tracking_order_id")
                        .table(OrderTracking::Table)
                        .col(OrderTracking::OrderId)
                        .to_owned(),
                )
                .await?;

            // Create payment_transactions table aligned with
            // entities::payment_transaction Model
            manager
                .create_table(
                    Table::create()
                        .table(PaymentTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PaymentTransactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentTransactions::OrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentTransactions::Amount)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentTransactions::Currency)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentTransactions::Method)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentTransactions::ProviderReference)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(PaymentTransactions::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentTransactions::FailureReason)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PaymentTransactions::CompletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PaymentTransactions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentTransactions::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payment_transactions_order_id")
                                .from(PaymentTransactions::Table, PaymentTransactions::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payment_transactions_order_id")
                        .table(PaymentTransactions::Table)
                        .col(PaymentTransactions::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payment_transactions_status")
                        .table(PaymentTransactions::Table)
                        .col(PaymentTransactions::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PaymentTransactions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrderTracking::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        OrderNumber,
        UserId,
        Status,
        PaymentStatus,
        PaymentMethod,
        DeliveryRegion,
        DeliveryCity,
        DeliveryStreet,
        DeliveryDetails,
        ContactPhone,
        Subtotal,
        DeliveryFee,
        TotalAmount,
        Currency,
        PaidAt,
        CancelledAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        ProductId,
        FarmerId,
        ProductName,
        Quantity,
        UnitPrice,
        LineTotal,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderTracking {
        Table,
        Id,
        OrderId,
        Status,
        Note,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum PaymentTransactions {
        Table,
        Id,
        OrderId,
        Amount,
        Currency,
        Method,
        ProviderReference,
        Status,
        FailureReason,
        CompletedAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250101_000005_create_verification_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000005_create_verification_tables"
        }
    }

    #[async_trait::async_trait]
    // SchemaManager must stay elided here: async_trait makes an explicit
    // lifetime early-bound, which no longer matches the trait (E0195).
    #[allow(elided_lifetimes_in_paths)]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create farmer_verifications table aligned with
            // entities::farmer_verification Model
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
                                .to(
                                    super::m20250101_000001_create_users_tables::Users::Table,
                                    super::m20250101_000001_create_users_tables::Users::Id,
                                )
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

            // Create verification_otps table aligned with
            // entities::verification_otp Model
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
                                .to(
                                    super::m20250101_000001_create_users_tables::Users::Table,
                                    super::m20250101_000001_create_users_tables::Users::Id,
                                )
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
}

mod m20250101_000006_create_warehouse_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000006_create_warehouse_tables"
        }
    }

    #[async_trait::async_trait]
    // SchemaManager must stay elided here: async_trait makes an explicit
    // lifetime early-bound, which no longer matches the trait (E0195).
    #[allow(elided_lifetimes_in_paths)]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create warehouses table aligned with entities::warehouse Model
            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Warehouses::Name).string().not_null())
                        .col(ColumnDef::new(Warehouses::Region).string().not_null())
                        .col(ColumnDef::new(Warehouses::City).string().null())
                        .col(
                            ColumnDef::new(Warehouses::TotalStockValue)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Warehouses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Warehouses::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_warehouses_region")
                        .table(Warehouses::Table)
                        .col(Warehouses::Region)
                        .to_owned(),
                )
                .await?;

            // Create warehouse_inventory table aligned with
            // entities::warehouse_inventory Model
            manager
                .create_table(
                    Table::create()
                        .table(WarehouseInventory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WarehouseInventory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseInventory::WarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseInventory::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseInventory::QuantityOnHand)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(WarehouseInventory::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseInventory::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_warehouse_inventory_warehouse_id")
                                .from(WarehouseInventory::Table, WarehouseInventory::WarehouseId)
                                .to(Warehouses::Table, Warehouses::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_warehouse_inventory_product_id")
                                .from(WarehouseInventory::Table, WarehouseInventory::ProductId)
                                .to(
                                    super::m20250101_000002_create_products_table::Products::Table,
                                    super::m20250101_000002_create_products_table::Products::Id,
                                )
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // One row per product per warehouse
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_warehouse_inventory_warehouse_id_product_id")
                        .table(WarehouseInventory::Table)
                        .col(WarehouseInventory::WarehouseId)
                        .col(WarehouseInventory::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            // Create stock_movements table aligned with
            // entities::stock_movement Model. Append-only; product_id is
            // deliberately not a foreign key so the ledger survives
            // catalog changes.
            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::WarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockMovements::Direction)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::Reason).string().null())
                        .col(
                            ColumnDef::new(StockMovements::RecordedBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_movements_warehouse_id")
                                .from(StockMovements::Table, StockMovements::WarehouseId)
                                .to(Warehouses::Table, Warehouses::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_warehouse_id")
                        .table(StockMovements::Table)
                        .col(StockMovements::WarehouseId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_product_id")
                        .table(StockMovements::Table)
                        .col(StockMovements::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_created_at")
                        .table(StockMovements::Table)
                        .col(StockMovements::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WarehouseInventory::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Warehouses {
        Table,
        Id,
        Name,
        Region,
        City,
        TotalStockValue,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum WarehouseInventory {
        Table,
        Id,
        WarehouseId,
        ProductId,
        QuantityOnHand,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum StockMovements {
        Table,
        Id,
        WarehouseId,
        ProductId,
        Direction,
        Quantity,
        Reason,
        RecordedBy,
        CreatedAt,
    }
}

mod m20250101_000007_create_reviews_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000007_create_reviews_tables"
        }
    }

    #[async_trait::async_trait]
    // SchemaManager must stay elided here: async_trait makes an explicit
    // lifetime early-bound, which no longer matches the trait (E0195).
    #[allow(elided_lifetimes_in_paths)]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create reviews table aligned with entities::review Model
            manager
                .create_table(
                    Table::create()
                        .table(Reviews::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Reviews::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Reviews::ProductId).uuid().not_null())
                        .col(ColumnDef::new(Reviews::BuyerId).uuid().not_null())
                        .col(ColumnDef::new(Reviews::Rating).integer().not_null())
                        .col(ColumnDef::new(Reviews::Comment).text().null())
                        .col(
                            ColumnDef::new(Reviews::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Reviews::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_reviews_product_id")
                                .from(Reviews::Table, Reviews::ProductId)
                                .to(
                                    super::m20250101_000002_create_products_table::Products::Table,
                                    super::m20250101_000002_create_products_table::Products::Id,
                                )
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_reviews_buyer_id")
                                .from(Reviews::Table, Reviews::BuyerId)
                                .to(
                                    super::m20250101_000001_create_users_tables::Users::Table,
                                    super::m20250101_000001_create_users_tables::Users::Id,
                                )
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // One review per buyer per product; later writes update in place
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_reviews_product_id_buyer_id")
                        .table(Reviews::Table)
                        .col(Reviews::ProductId)
                        .col(Reviews::BuyerId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            // Create notifications table aligned with entities::notification Model
            manager
                .create_table(
                    Table::create()
                        .table(Notifications::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Notifications::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Notifications::UserId).uuid().not_null())
                        .col(ColumnDef::new(Notifications::Title).string().not_null())
                        .col(ColumnDef::new(Notifications::Body).text().not_null())
                        .col(
                            ColumnDef::new(Notifications::ReadAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Notifications::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_notifications_user_id")
                                .from(Notifications::Table, Notifications::UserId)
                                .to(
                                    super::m20250101_000001_create_users_tables::Users::Table,
                                    super::m20250101_000001_create_users_tables::Users::Id,
                                )
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_notifications_user_id")
                        .table(Notifications::Table)
                        .col(Notifications::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Notifications::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Reviews::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Reviews {
        Table,
        Id,
        ProductId,
        BuyerId,
        Rating,
        Comment,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Notifications {
        Table,
        Id,
        UserId,
        Title,
        Body,
        ReadAt,
        CreatedAt,
    }
}
