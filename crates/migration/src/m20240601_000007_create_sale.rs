//! Create `sale` table. Totals are denormalized from `sale_item`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sale::Table)
                    .if_not_exists()
                    .col(uuid(Sale::Id).primary_key())
                    .col(uuid(Sale::CompanyId).not_null())
                    .col(string_len(Sale::CustomerName, 150).not_null())
                    .col(string_len(Sale::CustomerDocument, 14).not_null())
                    .col(string_len(Sale::Status, 16).not_null())
                    .col(ColumnDef::new(Sale::Subtotal).decimal_len(14, 2).not_null())
                    .col(ColumnDef::new(Sale::TaxTotal).decimal_len(14, 2).not_null())
                    .col(ColumnDef::new(Sale::Total).decimal_len(14, 2).not_null())
                    .col(ColumnDef::new(Sale::Notes).string_len(1000).null())
                    .col(ColumnDef::new(Sale::CancelReason).string_len(500).null())
                    .col(uuid(Sale::CreatedBy).not_null())
                    .col(ColumnDef::new(Sale::ConfirmedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Sale::CompletedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Sale::CancelledAt).timestamp_with_time_zone().null())
                    .col(boolean(Sale::IsDeleted).not_null())
                    .col(ColumnDef::new(Sale::DeletedAt).timestamp_with_time_zone().null())
                    .col(timestamp_with_time_zone(Sale::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Sale::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sale_company")
                            .from(Sale::Table, Sale::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sale_created_by")
                            .from(Sale::Table, Sale::CreatedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Sale::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Sale {
    Table,
    Id,
    CompanyId,
    CustomerName,
    CustomerDocument,
    Status,
    Subtotal,
    TaxTotal,
    Total,
    Notes,
    CancelReason,
    CreatedBy,
    ConfirmedAt,
    CompletedAt,
    CancelledAt,
    IsDeleted,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Company { Table, Id }

#[derive(DeriveIden)]
enum User { Table, Id }
