use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TokenMaster::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TokenMaster::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TokenMaster::CatalogId).string().null())
                    .col(ColumnDef::new(TokenMaster::Symbol).string().not_null())
                    .col(ColumnDef::new(TokenMaster::Name).string().not_null())
                    .col(ColumnDef::new(TokenMaster::ImageUrl).string().null())
                    .col(ColumnDef::new(TokenMaster::Rank).integer().null())
                    .col(
                        ColumnDef::new(TokenMaster::SyncedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Catalog id is the upsert key; unique when present
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_token_master_catalog_id")
                    .table(TokenMaster::Table)
                    .col(TokenMaster::CatalogId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TokenMaster::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TokenMaster {
    Table,
    Id,
    CatalogId,
    Symbol,
    Name,
    ImageUrl,
    Rank,
    SyncedAt,
}
