use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use uuid::Uuid;

use models::{category, product};

use super::{db_err, is_foreign_key_violation};
use crate::catalog::domain::{NewProduct, ProductSort, ProductSortField, ProductUpdate, SortDirection};
use crate::errors::ServiceError;
use crate::pagination::{Page, PageRequest};

fn sort_column(field: ProductSortField) -> product::Column {
    match field {
        ProductSortField::Name => product::Column::Name,
        ProductSortField::Price => product::Column::Price,
        ProductSortField::StockQuantity => product::Column::StockQuantity,
        ProductSortField::CreatedAt => product::Column::CreatedAt,
        ProductSortField::UpdatedAt => product::Column::UpdatedAt,
    }
}

fn sort_order(direction: SortDirection) -> Order {
    match direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    }
}

/// Escape LIKE metacharacters so the keyword matches literally.
fn like_escape(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') { out.push('\\'); }
        out.push(c);
    }
    out
}

fn active() -> Select<product::Entity> {
    product::Entity::find().filter(product::Column::IsActive.eq(true))
}

async fn fetch_page<C: ConnectionTrait>(db: &C, select: Select<product::Entity>, req: PageRequest) -> Result<Page<product::Model>, ServiceError> {
    let total = select.clone().count(db).await.map_err(db_err)?;
    // id as tie-breaker keeps page boundaries stable
    let items = select
        .order_by_asc(product::Column::Id)
        .offset(req.offset())
        .limit(req.size)
        .all(db)
        .await
        .map_err(db_err)?;
    Ok(Page::new(items, total, req))
}

async fn ensure_category<C: ConnectionTrait>(db: &C, category_id: Uuid) -> Result<(), ServiceError> {
    // FOR SHARE keeps the category alive until the product write commits
    let found = category::Entity::find_by_id(category_id).lock_shared().one(db).await.map_err(db_err)?;
    match found {
        Some(_) => Ok(()),
        None => Err(ServiceError::not_found("Category", category_id)),
    }
}

fn map_product_write_err(e: sea_orm::DbErr, category_id: Uuid) -> ServiceError {
    if is_foreign_key_violation(&e) { ServiceError::not_found("Category", category_id) } else { db_err(e) }
}

/// Insert a product under an existing category.
pub async fn insert_product(db: &DatabaseConnection, input: &NewProduct) -> Result<product::Model, ServiceError> {
    let txn = db.begin().await.map_err(db_err)?;
    ensure_category(&txn, input.category_id).await?;

    let now = Utc::now().into();
    let am = product::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name.clone()),
        description: Set(input.description.clone()),
        price: Set(input.price),
        stock_quantity: Set(input.stock_quantity),
        category_id: Set(input.category_id),
        is_active: Set(input.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let created = am.insert(&txn).await.map_err(|e| map_product_write_err(e, input.category_id))?;
    txn.commit().await.map_err(db_err)?;
    Ok(created)
}

/// Apply the supplied fields to a product, re-resolving a changed category.
pub async fn update_product(db: &DatabaseConnection, id: Uuid, changes: &ProductUpdate) -> Result<product::Model, ServiceError> {
    let txn = db.begin().await.map_err(db_err)?;
    let existing = product::Entity::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| ServiceError::not_found("Product", id))?;

    if let Some(cid) = changes.category_id {
        if cid != existing.category_id { ensure_category(&txn, cid).await?; }
    }

    let category_id = changes.category_id.unwrap_or(existing.category_id);
    let mut am: product::ActiveModel = existing.into();
    if let Some(v) = &changes.name { am.name = Set(v.clone()); }
    if let Some(v) = &changes.description { am.description = Set(v.clone()); }
    if let Some(v) = changes.price { am.price = Set(v); }
    if let Some(v) = changes.stock_quantity { am.stock_quantity = Set(v); }
    if let Some(v) = changes.category_id { am.category_id = Set(v); }
    if let Some(v) = changes.is_active { am.is_active = Set(v); }
    am.updated_at = Set(Utc::now().into());

    let updated = am.update(&txn).await.map_err(|e| map_product_write_err(e, category_id))?;
    txn.commit().await.map_err(db_err)?;
    Ok(updated)
}

/// Delete a product; returns true if deleted.
pub async fn delete_product<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<bool, ServiceError> {
    let res = product::Entity::delete_by_id(id).exec(db).await.map_err(db_err)?;
    Ok(res.rows_affected > 0)
}

pub async fn find_product<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<product::Model>, ServiceError> {
    product::Entity::find_by_id(id).one(db).await.map_err(db_err)
}

pub async fn list_active_products<C: ConnectionTrait>(db: &C, req: PageRequest, sort: ProductSort) -> Result<Page<product::Model>, ServiceError> {
    let select = active().order_by(sort_column(sort.field), sort_order(sort.direction));
    fetch_page(db, select, req).await
}

/// Case-insensitive substring match on the product name.
pub async fn search_active_products<C: ConnectionTrait>(db: &C, keyword: &str, req: PageRequest) -> Result<Page<product::Model>, ServiceError> {
    let pattern = format!("%{}%", like_escape(&keyword.to_lowercase()));
    let select = active()
        .filter(
            Expr::expr(Func::lower(Expr::col(product::Column::Name)))
                .like(LikeExpr::new(pattern).escape('\\')),
        )
        .order_by_asc(product::Column::Name);
    fetch_page(db, select, req).await
}

/// Inclusive price range.
pub async fn filter_active_products_by_price<C: ConnectionTrait>(
    db: &C,
    min: Decimal,
    max: Decimal,
    req: PageRequest,
) -> Result<Page<product::Model>, ServiceError> {
    let select = active()
        .filter(product::Column::Price.between(min, max))
        .order_by_asc(product::Column::Price);
    fetch_page(db, select, req).await
}

pub async fn list_active_products_in_category<C: ConnectionTrait>(db: &C, category_id: Uuid) -> Result<Vec<product::Model>, ServiceError> {
    active()
        .filter(product::Column::CategoryId.eq(category_id))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(db_err)
}

async fn adjust_stock(
    db: &DatabaseConnection,
    id: Uuid,
    next: impl FnOnce(&product::Model) -> Result<i32, ServiceError>,
) -> Result<product::Model, ServiceError> {
    let txn = db.begin().await.map_err(db_err)?;
    // row lock serializes concurrent adjustments of the same product
    let existing = product::Entity::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| ServiceError::not_found("Product", id))?;

    let quantity = next(&existing)?;
    let mut am: product::ActiveModel = existing.into();
    am.stock_quantity = Set(quantity);
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(&txn).await.map_err(db_err)?;
    txn.commit().await.map_err(db_err)?;
    Ok(updated)
}

pub async fn decrease_stock(db: &DatabaseConnection, id: Uuid, quantity: i32) -> Result<product::Model, ServiceError> {
    adjust_stock(db, id, |p| {
        if p.stock_quantity < quantity {
            return Err(ServiceError::insufficient_stock(&p.name));
        }
        Ok(p.stock_quantity - quantity)
    })
    .await
}

pub async fn increase_stock(db: &DatabaseConnection, id: Uuid, quantity: i32) -> Result<product::Model, ServiceError> {
    adjust_stock(db, id, |p| {
        p.stock_quantity
            .checked_add(quantity)
            .ok_or_else(|| ServiceError::InvalidArgument(format!("Stock overflow for product: {}", p.name)))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::like_escape;

    #[test]
    fn like_escape_neutralises_wildcards() {
        assert_eq!(like_escape("50%_off"), "50\\%\\_off");
        assert_eq!(like_escape("plain"), "plain");
        assert_eq!(like_escape("a\\b"), "a\\\\b");
    }
}
