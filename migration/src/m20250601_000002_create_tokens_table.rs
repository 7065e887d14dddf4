use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Token::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Token::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Token::MasterId).uuid().not_null())
                    .col(ColumnDef::new(Token::Chain).string().not_null())
                    .col(ColumnDef::new(Token::ContractAddress).string().not_null())
                    .col(
                        ColumnDef::new(Token::SyncedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_token_master")
                            .from(Token::Table, Token::MasterId)
                            .to(TokenMaster::Table, TokenMaster::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_token_chain_address")
                    .table(Token::Table)
                    .col(Token::Chain)
                    .col(Token::ContractAddress)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_token_master_id")
                    .table(Token::Table)
                    .col(Token::MasterId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Token::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Token {
    Table,
    Id,
    MasterId,
    Chain,
    ContractAddress,
    SyncedAt,
}

#[derive(DeriveIden)]
enum TokenMaster {
    Table,
    Id,
}
