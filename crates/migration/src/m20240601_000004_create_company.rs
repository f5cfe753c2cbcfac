//! Create `company` table. `document` holds the 14-digit CNPJ.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Company::Table)
                    .if_not_exists()
                    .col(uuid(Company::Id).primary_key())
                    .col(string_len(Company::Name, 150).not_null())
                    .col(ColumnDef::new(Company::TradeName).string_len(150).null())
                    .col(string_len(Company::Document, 14).unique_key().not_null())
                    .col(ColumnDef::new(Company::Email).string_len(255).null())
                    .col(ColumnDef::new(Company::Phone).string_len(20).null())
                    .col(boolean(Company::IsDeleted).not_null())
                    .col(ColumnDef::new(Company::DeletedAt).timestamp_with_time_zone().null())
                    .col(timestamp_with_time_zone(Company::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Company::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Company::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Company {
    Table,
    Id,
    Name,
    TradeName,
    Document,
    Email,
    Phone,
    IsDeleted,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}
