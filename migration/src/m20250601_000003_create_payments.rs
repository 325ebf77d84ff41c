use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Payment intents: provisional records resolved exactly once by
        // verification. tx_ref is the idempotency key.
        manager
            .create_table(
                Table::create()
                    .table(PaymentIntents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentIntents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PaymentIntents::TxRef).string().not_null())
                    .col(ColumnDef::new(PaymentIntents::PayerId).uuid().not_null())
                    .col(ColumnDef::new(PaymentIntents::CreatorId).uuid().not_null())
                    .col(ColumnDef::new(PaymentIntents::BundleId).uuid().null())
                    .col(ColumnDef::new(PaymentIntents::PostId).uuid().null())
                    .col(
                        ColumnDef::new(PaymentIntents::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentIntents::Purpose).string().not_null())
                    .col(
                        ColumnDef::new(PaymentIntents::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(PaymentIntents::TipMessage).string().null())
                    .col(ColumnDef::new(PaymentIntents::ProviderTxId).string().null())
                    .col(
                        ColumnDef::new(PaymentIntents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentIntents::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_intents_tx_ref")
                    .table(PaymentIntents::Table)
                    .col(PaymentIntents::TxRef)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Settled ledger. One row per tx_ref, enforced by the unique index;
        // grant uses ON CONFLICT DO NOTHING against it.
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::TxRef).string().not_null())
                    .col(ColumnDef::new(Transactions::PayerId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::CreatorId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::BundleId).uuid().null())
                    .col(ColumnDef::new(Transactions::PostId).uuid().null())
                    .col(ColumnDef::new(Transactions::Purpose).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::CreatorShare)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::PlatformShare)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::ReferrerShare)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Transactions::ReferrerId).uuid().null())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_tx_ref")
                    .table(Transactions::Table)
                    .col(Transactions::TxRef)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_creator")
                    .table(Transactions::Table)
                    .col(Transactions::CreatorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentIntents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PaymentIntents {
    Table,
    Id,
    TxRef,
    PayerId,
    CreatorId,
    BundleId,
    PostId,
    Amount,
    Purpose,
    Status,
    TipMessage,
    ProviderTxId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    TxRef,
    PayerId,
    CreatorId,
    BundleId,
    PostId,
    Purpose,
    Amount,
    CreatorShare,
    PlatformShare,
    ReferrerShare,
    ReferrerId,
    CreatedAt,
}
