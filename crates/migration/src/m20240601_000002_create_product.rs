//! Create `product` table.
//! Products reference their category with ON DELETE RESTRICT, so a category
//! that still has products cannot be removed even by a direct delete.
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
                    .col(string_len(Product::Name, 100).not_null())
                    .col(string_len(Product::Description, 500).not_null())
                    .col(
                        decimal_len(Product::Price, 19, 4)
                            .not_null()
                            .check(Expr::col(Product::Price).gt(0)),
                    )
                    .col(
                        integer(Product::StockQuantity)
                            .not_null()
                            .default(0)
                            .check(Expr::col(Product::StockQuantity).gte(0)),
                    )
                    .col(uuid(Product::CategoryId).not_null())
                    .col(boolean(Product::IsActive).not_null().default(true))
                    .col(timestamp_with_time_zone(Product::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Product::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_category")
                            .from(Product::Table, Product::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Restrict)
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
    Name,
    Description,
    Price,
    StockQuantity,
    CategoryId,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Category { Table, Id }
