use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WalletTokenBalance::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WalletTokenBalance::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WalletTokenBalance::WalletId).uuid().not_null())
                    .col(ColumnDef::new(WalletTokenBalance::TokenId).uuid().not_null())
                    .col(
                        ColumnDef::new(WalletTokenBalance::Balance)
                            .decimal_len(50, 24)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTokenBalance::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_wallet_token_balance_wallet")
                            .from(WalletTokenBalance::Table, WalletTokenBalance::WalletId)
                            .to(Wallet::Table, Wallet::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_wallet_token_balance_token")
                            .from(WalletTokenBalance::Table, WalletTokenBalance::TokenId)
                            .to(Token::Table, Token::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_wallet_token_balance_wallet_token")
                    .table(WalletTokenBalance::Table)
                    .col(WalletTokenBalance::WalletId)
                    .col(WalletTokenBalance::TokenId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WalletTokenBalance::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WalletTokenBalance {
    Table,
    Id,
    WalletId,
    TokenId,
    Balance,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Wallet {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Token {
    Table,
    Id,
}
