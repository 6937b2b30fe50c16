pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users_tables;
mod m20250101_000002_create_products_table;
mod m20250101_000003_create_carts_tables;
mod m20250101_000004_create_orders_tables;
mod m20250101_000005_create_verification_tables;
mod m20250101_000006_create_warehouse_tables;
mod m20250101_000007_create_reviews_tables;

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
