use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use models::{category, product};

use super::domain::{CategoryInput, NewProduct, ProductSort, ProductUpdate};
use crate::errors::ServiceError;
use crate::pagination::{Page, PageRequest};

/// Storage for categories and products.
///
/// Implementations are the final authority on integrity: every write below
/// re-checks its precondition atomically with the write itself, so callers
/// may pre-check for friendlier errors but never rely on the pre-check alone.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// `Conflict` when the name collides case-insensitively.
    async fn insert_category(&self, input: &CategoryInput) -> Result<category::Model, ServiceError>;
    /// `NotFound` for an unknown id, `Conflict` when the new name is taken.
    async fn update_category(&self, id: Uuid, input: &CategoryInput) -> Result<category::Model, ServiceError>;
    /// `Ok(false)` for an unknown id, `Conflict` while products reference it.
    async fn delete_category(&self, id: Uuid) -> Result<bool, ServiceError>;
    async fn find_category(&self, id: Uuid) -> Result<Option<category::Model>, ServiceError>;
    async fn category_exists(&self, id: Uuid) -> Result<bool, ServiceError>;
    async fn category_name_exists(&self, name: &str) -> Result<bool, ServiceError>;
    async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError>;
    /// Counts active and inactive products alike.
    async fn count_products_in_category(&self, category_id: Uuid) -> Result<u64, ServiceError>;

    /// `NotFound` when the category does not resolve.
    async fn insert_product(&self, input: &NewProduct) -> Result<product::Model, ServiceError>;
    /// `NotFound` for an unknown product or a changed category that does not resolve.
    async fn update_product(&self, id: Uuid, changes: &ProductUpdate) -> Result<product::Model, ServiceError>;
    async fn delete_product(&self, id: Uuid) -> Result<bool, ServiceError>;
    async fn find_product(&self, id: Uuid) -> Result<Option<product::Model>, ServiceError>;
    async fn list_active_products(&self, page: PageRequest, sort: ProductSort) -> Result<Page<product::Model>, ServiceError>;
    async fn search_active_products(&self, keyword: &str, page: PageRequest) -> Result<Page<product::Model>, ServiceError>;
    async fn filter_active_products_by_price(&self, min: Decimal, max: Decimal, page: PageRequest) -> Result<Page<product::Model>, ServiceError>;
    async fn list_active_products_in_category(&self, category_id: Uuid) -> Result<Vec<product::Model>, ServiceError>;

    /// `NotFound` for an unknown product, `InvalidArgument` when stock would go negative.
    async fn decrease_stock(&self, id: Uuid, quantity: i32) -> Result<product::Model, ServiceError>;
    /// `NotFound` for an unknown product, `InvalidArgument` on overflow.
    async fn increase_stock(&self, id: Uuid, quantity: i32) -> Result<product::Model, ServiceError>;
}
