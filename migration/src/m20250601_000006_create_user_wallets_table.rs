use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserWallet::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserWallet::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(UserWallet::UserId).string().not_null())
                    .col(ColumnDef::new(UserWallet::WalletId).uuid().not_null())
                    .col(ColumnDef::new(UserWallet::Name).string().null())
                    .col(
                        ColumnDef::new(UserWallet::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_wallet_wallet")
                            .from(UserWallet::Table, UserWallet::WalletId)
                            .to(Wallet::Table, Wallet::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_wallet_user_wallet")
                    .table(UserWallet::Table)
                    .col(UserWallet::UserId)
                    .col(UserWallet::WalletId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserWallet::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserWallet {
    Table,
    Id,
    UserId,
    WalletId,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Wallet {
    Table,
    Id,
}
