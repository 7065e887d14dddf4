use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TokenPrice::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TokenPrice::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TokenPrice::MasterId).uuid().not_null())
                    .col(ColumnDef::new(TokenPrice::Source).string().not_null())
                    .col(
                        ColumnDef::new(TokenPrice::PriceUsd)
                            .decimal_len(50, 24)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TokenPrice::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_token_price_master")
                            .from(TokenPrice::Table, TokenPrice::MasterId)
                            .to(TokenMaster::Table, TokenMaster::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One price row per master per source
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_token_price_master_source")
                    .table(TokenPrice::Table)
                    .col(TokenPrice::MasterId)
                    .col(TokenPrice::Source)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TokenPrice::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TokenPrice {
    Table,
    Id,
    MasterId,
    Source,
    PriceUsd,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TokenMaster {
    Table,
    Id,
}
