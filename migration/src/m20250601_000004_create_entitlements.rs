use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subscriptions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::SubscriberId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Subscriptions::CreatorId).uuid().not_null())
                    .col(ColumnDef::new(Subscriptions::BundleId).uuid().not_null())
                    .col(
                        ColumnDef::new(Subscriptions::SubscribedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_subscriptions_subscriber_creator")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::SubscriberId)
                    .col(Subscriptions::CreatorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PurchasedContent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchasedContent::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PurchasedContent::UserId).uuid().not_null())
                    .col(ColumnDef::new(PurchasedContent::PostId).uuid().not_null())
                    .col(
                        ColumnDef::new(PurchasedContent::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchasedContent::TxRef).string().not_null())
                    .col(
                        ColumnDef::new(PurchasedContent::PurchasedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchased_content_user_post")
                    .table(PurchasedContent::Table)
                    .col(PurchasedContent::UserId)
                    .col(PurchasedContent::PostId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PurchasedContent::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Subscriptions {
    Table,
    Id,
    SubscriberId,
    CreatorId,
    BundleId,
    SubscribedAt,
    ExpiresAt,
    Status,
}

#[derive(DeriveIden)]
enum PurchasedContent {
    Table,
    Id,
    UserId,
    PostId,
    Amount,
    TxRef,
    PurchasedAt,
}
