use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ChainTokenDecimals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChainTokenDecimals::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ChainTokenDecimals::TokenId).uuid().not_null())
                    .col(
                        ColumnDef::new(ChainTokenDecimals::Decimals)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChainTokenDecimals::RefreshedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chain_token_decimals_token")
                            .from(ChainTokenDecimals::Table, ChainTokenDecimals::TokenId)
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
                    .name("idx_chain_token_decimals_token")
                    .table(ChainTokenDecimals::Table)
                    .col(ChainTokenDecimals::TokenId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChainTokenDecimals::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ChainTokenDecimals {
    Table,
    Id,
    TokenId,
    Decimals,
    RefreshedAt,
}

#[derive(DeriveIden)]
enum Token {
    Table,
    Id,
}
