use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEXES: &[(&str, &str, &str)] = &[
    ("idx_product_category", "product", "category_id"),
    ("idx_product_company", "product", "company_id"),
    ("idx_product_tax", "product", "tax_id"),
    ("idx_product_is_deleted", "product", "is_deleted"),
    ("idx_sale_company", "sale", "company_id"),
    ("idx_sale_status", "sale", "status"),
    ("idx_sale_created_at", "sale", "created_at"),
    ("idx_sale_item_sale", "sale_item", "sale_id"),
    ("idx_sale_item_product", "sale_item", "product_id"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, column) in INDEXES {
            manager
                .create_index(
                    Index::create()
                        .name(*name)
                        .table(Alias::new(*table))
                        .col(Alias::new(*column))
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, _) in INDEXES.iter().rev() {
            manager
                .drop_index(Index::drop().name(*name).table(Alias::new(*table)).to_owned())
                .await?;
        }
        Ok(())
    }
}
