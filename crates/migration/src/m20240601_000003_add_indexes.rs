use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Product: per-category lookups and deletability counts
        manager
            .create_index(
                Index::create()
                    .name("idx_product_category")
                    .table(Product::Table)
                    .col(Product::CategoryId)
                    .to_owned(),
            )
            .await?;

        // Product: active listing and price-range filter
        manager
            .create_index(
                Index::create()
                    .name("idx_product_active_price")
                    .table(Product::Table)
                    .col(Product::IsActive)
                    .col(Product::Price)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_product_category").table(Product::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_product_active_price").table(Product::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Product { Table, CategoryId, IsActive, Price }
