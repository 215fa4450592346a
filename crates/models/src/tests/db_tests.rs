use chrono::Utc;
use migration::MigratorTrait;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set, SqlErr};
use uuid::Uuid;

use crate::{category, db, product};

/// Connect and migrate, or `None` when no database is configured.
async fn setup_test_db() -> anyhow::Result<Option<DatabaseConnection>> {
    if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() {
        return Ok(None);
    }
    let db = db::connect().await?;
    migration::Migrator::up(&db, None).await?;
    Ok(Some(db))
}

fn new_category(name: &str) -> category::ActiveModel {
    let now = Utc::now().into();
    category::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        name_key: Set(category::name_key(name)),
        description: Set("test category".into()),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

fn new_product(category_id: Uuid, stock: i32) -> product::ActiveModel {
    let now = Utc::now().into();
    product::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Schema test product".into()),
        description: Set("exercises schema constraints".into()),
        price: Set(Decimal::new(1999, 2)),
        stock_quantity: Set(stock),
        category_id: Set(category_id),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

fn sql_err(e: &DbErr) -> Option<SqlErr> { e.sql_err() }

#[tokio::test]
async fn category_name_key_is_unique() -> anyhow::Result<()> {
    let Some(db) = setup_test_db().await? else { return Ok(()) };

    let name = format!("Schema_{}", Uuid::new_v4().simple());
    let first = new_category(&name).insert(&db).await?;
    let dup = new_category(&name.to_uppercase()).insert(&db).await.unwrap_err();
    assert!(matches!(sql_err(&dup), Some(SqlErr::UniqueConstraintViolation(_))));

    category::Entity::delete_by_id(first.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn product_requires_existing_category_and_blocks_its_delete() -> anyhow::Result<()> {
    let Some(db) = setup_test_db().await? else { return Ok(()) };

    let orphan = new_product(Uuid::new_v4(), 1).insert(&db).await.unwrap_err();
    assert!(matches!(sql_err(&orphan), Some(SqlErr::ForeignKeyConstraintViolation(_))));

    let c = new_category(&format!("Schema_{}", Uuid::new_v4().simple())).insert(&db).await?;
    let p = new_product(c.id, 1).insert(&db).await?;
    let blocked = category::Entity::delete_by_id(c.id).exec(&db).await.unwrap_err();
    assert!(matches!(sql_err(&blocked), Some(SqlErr::ForeignKeyConstraintViolation(_))));

    product::Entity::delete_by_id(p.id).exec(&db).await?;
    category::Entity::delete_by_id(c.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn negative_stock_is_rejected_by_schema() -> anyhow::Result<()> {
    let Some(db) = setup_test_db().await? else { return Ok(()) };

    let c = new_category(&format!("Schema_{}", Uuid::new_v4().simple())).insert(&db).await?;
    assert!(new_product(c.id, -1).insert(&db).await.is_err());

    category::Entity::delete_by_id(c.id).exec(&db).await?;
    Ok(())
}
