use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use models::{category, product};

use super::{db_err, is_foreign_key_violation, is_unique_violation};
use crate::catalog::domain::CategoryInput;
use crate::errors::ServiceError;

async fn name_key_taken<C: ConnectionTrait>(db: &C, key: &str, except: Option<Uuid>) -> Result<bool, ServiceError> {
    let mut finder = category::Entity::find().filter(category::Column::NameKey.eq(key));
    if let Some(id) = except { finder = finder.filter(category::Column::Id.ne(id)); }
    let n = finder.count(db).await.map_err(db_err)?;
    Ok(n > 0)
}

/// Insert a category; the unique `name_key` index rejects case-insensitive duplicates.
pub async fn insert_category(db: &DatabaseConnection, input: &CategoryInput) -> Result<category::Model, ServiceError> {
    let now = Utc::now().into();
    let am = category::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name.clone()),
        name_key: Set(category::name_key(&input.name)),
        description: Set(input.description.clone()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| {
        if is_unique_violation(&e) { ServiceError::duplicate_category_name(&input.name) } else { db_err(e) }
    })
}

/// Replace name and description of an existing category.
pub async fn update_category(db: &DatabaseConnection, id: Uuid, input: &CategoryInput) -> Result<category::Model, ServiceError> {
    let txn = db.begin().await.map_err(db_err)?;
    let existing = category::Entity::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| ServiceError::not_found("Category", id))?;

    let key = category::name_key(&input.name);
    if key != existing.name_key && name_key_taken(&txn, &key, Some(id)).await? {
        return Err(ServiceError::duplicate_category_name(&input.name));
    }

    let mut am: category::ActiveModel = existing.into();
    am.name = Set(input.name.clone());
    am.name_key = Set(key);
    am.description = Set(input.description.clone());
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(&txn).await.map_err(|e| {
        if is_unique_violation(&e) { ServiceError::duplicate_category_name(&input.name) } else { db_err(e) }
    })?;
    txn.commit().await.map_err(db_err)?;
    Ok(updated)
}

/// Delete a category that no product references; returns false if it did not exist.
pub async fn delete_category(db: &DatabaseConnection, id: Uuid) -> Result<bool, ServiceError> {
    let txn = db.begin().await.map_err(db_err)?;
    // FOR UPDATE conflicts with the key-share lock a concurrent product insert takes
    let existing = category::Entity::find_by_id(id).lock_exclusive().one(&txn).await.map_err(db_err)?;
    if existing.is_none() { return Ok(false); }

    if count_products_in_category(&txn, id).await? > 0 {
        return Err(ServiceError::category_has_products());
    }
    let res = category::Entity::delete_by_id(id).exec(&txn).await.map_err(|e| {
        if is_foreign_key_violation(&e) { ServiceError::category_has_products() } else { db_err(e) }
    })?;
    txn.commit().await.map_err(db_err)?;
    Ok(res.rows_affected > 0)
}

pub async fn find_category<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<category::Model>, ServiceError> {
    category::Entity::find_by_id(id).one(db).await.map_err(db_err)
}

pub async fn category_exists<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<bool, ServiceError> {
    let n = category::Entity::find_by_id(id).count(db).await.map_err(db_err)?;
    Ok(n > 0)
}

pub async fn category_name_exists<C: ConnectionTrait>(db: &C, name: &str) -> Result<bool, ServiceError> {
    name_key_taken(db, &category::name_key(name), None).await
}

pub async fn list_categories<C: ConnectionTrait>(db: &C) -> Result<Vec<category::Model>, ServiceError> {
    category::Entity::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(db_err)
}

pub async fn count_products_in_category<C: ConnectionTrait>(db: &C, category_id: Uuid) -> Result<u64, ServiceError> {
    product::Entity::find()
        .filter(product::Column::CategoryId.eq(category_id))
        .count(db)
        .await
        .map_err(db_err)
}
