use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TokenExternalId::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TokenExternalId::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TokenExternalId::ExternalId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TokenExternalId::Rank).integer().null())
                    .col(ColumnDef::new(TokenExternalId::Name).string().not_null())
                    .col(ColumnDef::new(TokenExternalId::Symbol).string().not_null())
                    .col(ColumnDef::new(TokenExternalId::Slug).string().not_null())
                    .col(
                        ColumnDef::new(TokenExternalId::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(TokenExternalId::LogoUrl).string().null())
                    .col(
                        ColumnDef::new(TokenExternalId::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_token_external_id_external")
                    .table(TokenExternalId::Table)
                    .col(TokenExternalId::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TokenExternalId::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TokenExternalId {
    Table,
    Id,
    ExternalId,
    Rank,
    Name,
    Symbol,
    Slug,
    IsActive,
    LogoUrl,
    UpdatedAt,
}
