//! In-process catalog store.
//!
//! All state sits behind a single `RwLock`; writers hold the write guard for
//! the whole check-then-write sequence, which gives the same serialisation the
//! PostgreSQL store gets from row locks and constraints.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use models::{category, product};

use crate::catalog::domain::{CategoryInput, NewProduct, ProductSort, ProductSortField, ProductUpdate, SortDirection};
use crate::catalog::repository::CatalogRepository;
use crate::errors::ServiceError;
use crate::pagination::{Page, PageRequest};

#[derive(Default)]
struct MemoryState {
    categories: HashMap<Uuid, category::Model>,
    products: HashMap<Uuid, product::Model>,
}

impl MemoryState {
    fn name_key_taken(&self, key: &str, except: Option<Uuid>) -> bool {
        self.categories.values().any(|c| c.name_key == key && Some(c.id) != except)
    }

    fn products_in_category(&self, category_id: Uuid) -> impl Iterator<Item = &product::Model> {
        self.products.values().filter(move |p| p.category_id == category_id)
    }

    fn active_products(&self) -> impl Iterator<Item = &product::Model> {
        self.products.values().filter(|p| p.is_active)
    }
}

#[derive(Default)]
pub struct MemoryCatalogRepository {
    state: RwLock<MemoryState>,
}

impl MemoryCatalogRepository {
    pub fn new() -> Self { Self::default() }
}

fn compare(a: &product::Model, b: &product::Model, field: ProductSortField) -> Ordering {
    match field {
        ProductSortField::Name => a.name.cmp(&b.name),
        ProductSortField::Price => a.price.cmp(&b.price),
        ProductSortField::StockQuantity => a.stock_quantity.cmp(&b.stock_quantity),
        ProductSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        ProductSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
}

fn sorted(mut items: Vec<product::Model>, sort: ProductSort) -> Vec<product::Model> {
    items.sort_by(|a, b| {
        let ord = compare(a, b, sort.field);
        let ord = match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        ord.then_with(|| a.id.cmp(&b.id))
    });
    items
}

fn by_name() -> ProductSort { ProductSort { field: ProductSortField::Name, direction: SortDirection::Asc } }

#[async_trait]
impl CatalogRepository for MemoryCatalogRepository {
    async fn insert_category(&self, input: &CategoryInput) -> Result<category::Model, ServiceError> {
        let mut state = self.state.write().await;
        let key = category::name_key(&input.name);
        if state.name_key_taken(&key, None) {
            return Err(ServiceError::duplicate_category_name(&input.name));
        }
        let now = Utc::now().into();
        let created = category::Model {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            name_key: key,
            description: input.description.clone(),
            created_at: now,
            updated_at: now,
        };
        state.categories.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_category(&self, id: Uuid, input: &CategoryInput) -> Result<category::Model, ServiceError> {
        let mut state = self.state.write().await;
        if !state.categories.contains_key(&id) {
            return Err(ServiceError::not_found("Category", id));
        }
        let key = category::name_key(&input.name);
        if state.name_key_taken(&key, Some(id)) {
            return Err(ServiceError::duplicate_category_name(&input.name));
        }
        let existing = state.categories.get_mut(&id).ok_or_else(|| ServiceError::not_found("Category", id))?;
        existing.name = input.name.clone();
        existing.name_key = key;
        existing.description = input.description.clone();
        existing.updated_at = Utc::now().into();
        Ok(existing.clone())
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, ServiceError> {
        let mut state = self.state.write().await;
        if !state.categories.contains_key(&id) {
            return Ok(false);
        }
        if state.products_in_category(id).next().is_some() {
            return Err(ServiceError::category_has_products());
        }
        Ok(state.categories.remove(&id).is_some())
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<category::Model>, ServiceError> {
        Ok(self.state.read().await.categories.get(&id).cloned())
    }

    async fn category_exists(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.state.read().await.categories.contains_key(&id))
    }

    async fn category_name_exists(&self, name: &str) -> Result<bool, ServiceError> {
        Ok(self.state.read().await.name_key_taken(&category::name_key(name), None))
    }

    async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        let mut all: Vec<_> = self.state.read().await.categories.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn count_products_in_category(&self, category_id: Uuid) -> Result<u64, ServiceError> {
        Ok(self.state.read().await.products_in_category(category_id).count() as u64)
    }

    async fn insert_product(&self, input: &NewProduct) -> Result<product::Model, ServiceError> {
        let mut state = self.state.write().await;
        if !state.categories.contains_key(&input.category_id) {
            return Err(ServiceError::not_found("Category", input.category_id));
        }
        let now = Utc::now().into();
        let created = product::Model {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            stock_quantity: input.stock_quantity,
            category_id: input.category_id,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        state.products.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_product(&self, id: Uuid, changes: &ProductUpdate) -> Result<product::Model, ServiceError> {
        let mut state = self.state.write().await;
        let current_category = state
            .products
            .get(&id)
            .map(|p| p.category_id)
            .ok_or_else(|| ServiceError::not_found("Product", id))?;
        if let Some(cid) = changes.category_id {
            if cid != current_category && !state.categories.contains_key(&cid) {
                return Err(ServiceError::not_found("Category", cid));
            }
        }
        let existing = state.products.get_mut(&id).ok_or_else(|| ServiceError::not_found("Product", id))?;
        changes.apply_to(existing);
        existing.updated_at = Utc::now().into();
        Ok(existing.clone())
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.state.write().await.products.remove(&id).is_some())
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<product::Model>, ServiceError> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn list_active_products(&self, page: PageRequest, sort: ProductSort) -> Result<Page<product::Model>, ServiceError> {
        let matches: Vec<_> = self.state.read().await.active_products().cloned().collect();
        Ok(Page::slice(sorted(matches, sort), page))
    }

    async fn search_active_products(&self, keyword: &str, page: PageRequest) -> Result<Page<product::Model>, ServiceError> {
        let needle = keyword.to_lowercase();
        let matches: Vec<_> = self
            .state
            .read()
            .await
            .active_products()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Ok(Page::slice(sorted(matches, by_name()), page))
    }

    async fn filter_active_products_by_price(&self, min: Decimal, max: Decimal, page: PageRequest) -> Result<Page<product::Model>, ServiceError> {
        let matches: Vec<_> = self
            .state
            .read()
            .await
            .active_products()
            .filter(|p| p.price >= min && p.price <= max)
            .cloned()
            .collect();
        let sort = ProductSort { field: ProductSortField::Price, direction: SortDirection::Asc };
        Ok(Page::slice(sorted(matches, sort), page))
    }

    async fn list_active_products_in_category(&self, category_id: Uuid) -> Result<Vec<product::Model>, ServiceError> {
        let matches: Vec<_> = self
            .state
            .read()
            .await
            .products_in_category(category_id)
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        Ok(sorted(matches, by_name()))
    }

    async fn decrease_stock(&self, id: Uuid, quantity: i32) -> Result<product::Model, ServiceError> {
        let mut state = self.state.write().await;
        let existing = state.products.get_mut(&id).ok_or_else(|| ServiceError::not_found("Product", id))?;
        if existing.stock_quantity < quantity {
            return Err(ServiceError::insufficient_stock(&existing.name));
        }
        existing.stock_quantity -= quantity;
        existing.updated_at = Utc::now().into();
        Ok(existing.clone())
    }

    async fn increase_stock(&self, id: Uuid, quantity: i32) -> Result<product::Model, ServiceError> {
        let mut state = self.state.write().await;
        let existing = state.products.get_mut(&id).ok_or_else(|| ServiceError::not_found("Product", id))?;
        existing.stock_quantity = existing
            .stock_quantity
            .checked_add(quantity)
            .ok_or_else(|| ServiceError::InvalidArgument(format!("Stock overflow for product: {}", existing.name)))?;
        existing.updated_at = Utc::now().into();
        Ok(existing.clone())
    }
}
