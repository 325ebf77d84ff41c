pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_users;
mod m20250601_000002_create_catalog;
mod m20250601_000003_create_payments;
mod m20250601_000004_create_entitlements;
mod m20250601_000005_create_withdrawals_and_chat;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_users::Migration),
            Box::new(m20250601_000002_create_catalog::Migration),
            Box::new(m20250601_000003_create_payments::Migration),
            Box::new(m20250601_000004_create_entitlements::Migration),
            Box::new(m20250601_000005_create_withdrawals_and_chat::Migration),
        ]
    }
}
