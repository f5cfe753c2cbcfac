//! Create `tax` table. `rate` is a percentage with four decimal places.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tax::Table)
                    .if_not_exists()
                    .col(uuid(Tax::Id).primary_key())
                    .col(string_len(Tax::Code, 20).unique_key().not_null())
                    .col(string_len(Tax::Name, 100).not_null())
                    .col(ColumnDef::new(Tax::Rate).decimal_len(7, 4).not_null())
                    .col(ColumnDef::new(Tax::Description).string_len(500).null())
                    .col(boolean(Tax::IsDeleted).not_null())
                    .col(ColumnDef::new(Tax::DeletedAt).timestamp_with_time_zone().null())
                    .col(timestamp_with_time_zone(Tax::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Tax::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Tax::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Tax { Table, Id, Code, Name, Rate, Description, IsDeleted, DeletedAt, CreatedAt, UpdatedAt }
