//! Create `category` table.
//!
//! `name_key` holds the lower-cased name; its unique constraint is what makes
//! category names unique regardless of case. Lower-casing can lengthen a name
//! (`İ` becomes two chars), so the key is unbounded `text`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Category::Table)
                    .if_not_exists()
                    .col(uuid(Category::Id).primary_key())
                    .col(string_len(Category::Name, 50).not_null())
                    .col(text(Category::NameKey).unique_key().not_null())
                    .col(text(Category::Description).not_null())
                    .col(timestamp_with_time_zone(Category::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Category::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Category::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Category { Table, Id, Name, NameKey, Description, CreatedAt, UpdatedAt }
