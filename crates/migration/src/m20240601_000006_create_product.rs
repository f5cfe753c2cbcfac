//! Create `product` table with FKs to `category`, `company` and `tax`.
//!
//! `reserved_stock` never exceeds `stock`; enforced by a CHECK constraint.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Product::Table)
                    .if_not_exists()
                    .col(uuid(Product::Id).primary_key())
                    .col(string_len(Product::Sku, 64).unique_key().not_null())
                    .col(string_len(Product::Name, 150).not_null())
                    .col(ColumnDef::new(Product::Description).text().null())
                    .col(ColumnDef::new(Product::Price).decimal_len(14, 2).not_null())
                    .col(integer(Product::Stock).not_null())
                    .col(integer(Product::ReservedStock).not_null())
                    .col(boolean(Product::IsActive).not_null())
                    .col(uuid(Product::CategoryId).not_null())
                    .col(uuid(Product::CompanyId).not_null())
                    .col(ColumnDef::new(Product::TaxId).uuid().null())
                    .col(boolean(Product::IsDeleted).not_null())
                    .col(ColumnDef::new(Product::DeletedAt).timestamp_with_time_zone().null())
                    .col(timestamp_with_time_zone(Product::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Product::UpdatedAt).not_null())
                    .check(Expr::col(Product::Stock).gte(0))
                    .check(Expr::col(Product::ReservedStock).gte(0))
                    .check(Expr::col(Product::ReservedStock).lte(Expr::col(Product::Stock)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_category")
                            .from(Product::Table, Product::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_company")
                            .from(Product::Table, Product::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_tax")
                            .from(Product::Table, Product::TaxId)
                            .to(Tax::Table, Tax::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Product::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Product {
    Table,
    Id,
    Sku,
    Name,
    Description,
    Price,
    Stock,
    ReservedStock,
    IsActive,
    CategoryId,
    CompanyId,
    TaxId,
    IsDeleted,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Category { Table, Id }

#[derive(DeriveIden)]
enum Company { Table, Id }

#[derive(DeriveIden)]
enum Tax { Table, Id }
