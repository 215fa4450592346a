use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use models::product;

use super::domain::{NewProduct, ProductSort, ProductUpdate};
use super::repository::CatalogRepository;
use crate::errors::ServiceError;
use crate::pagination::{Page, PageRequest};

/// Product business rules on top of a [`CatalogRepository`].
pub struct ProductService<R: CatalogRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: CatalogRepository + ?Sized> Clone for ProductService<R> {
    fn clone(&self) -> Self { Self { repo: self.repo.clone() } }
}

fn reject_negative(quantity: i32) -> Result<(), ServiceError> {
    if quantity < 0 {
        return Err(ServiceError::InvalidArgument("Quantity cannot be negative".into()));
    }
    Ok(())
}

impl<R: CatalogRepository + ?Sized> ProductService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    /// Create a product under an existing category.
    #[instrument(skip(self, input), fields(name = %input.name, category_id = %input.category_id))]
    pub async fn create(&self, input: NewProduct) -> Result<product::Model, ServiceError> {
        if !self.repo.category_exists(input.category_id).await? {
            return Err(ServiceError::not_found("Category", input.category_id));
        }
        let created = self.repo.insert_product(&input).await?;
        info!(product_id = %created.id, "product_created");
        Ok(created)
    }

    /// Overwrite the supplied fields; a changed category must resolve.
    #[instrument(skip(self, changes), fields(%id))]
    pub async fn update(&self, id: Uuid, changes: ProductUpdate) -> Result<product::Model, ServiceError> {
        let existing = self.get_by_id(id).await?;
        if let Some(cid) = changes.category_id {
            if cid != existing.category_id && !self.repo.category_exists(cid).await? {
                return Err(ServiceError::not_found("Category", cid));
            }
        }
        let updated = self.repo.update_product(id, &changes).await?;
        info!(product_id = %updated.id, "product_updated");
        Ok(updated)
    }

    #[instrument(skip(self), fields(%id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if !self.repo.delete_product(id).await? {
            return Err(ServiceError::not_found("Product", id));
        }
        info!(product_id = %id, "product_deleted");
        Ok(())
    }

    /// Fetch by id regardless of `is_active`.
    pub async fn get_by_id(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        self.repo
            .find_product(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    pub async fn list_active(&self, page: PageRequest, sort: ProductSort) -> Result<Page<product::Model>, ServiceError> {
        self.repo.list_active_products(page.normalize(), sort).await
    }

    /// Case-insensitive substring match on active product names.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::catalog::{ProductService, repo::MemoryCatalogRepository};
    /// use service::pagination::PageRequest;
    /// let svc = ProductService::new(Arc::new(MemoryCatalogRepository::new()));
    /// let page = tokio_test::block_on(svc.search("lamp", PageRequest::default())).unwrap();
    /// assert_eq!(page.total_count, 0);
    /// ```
    #[instrument(skip(self))]
    pub async fn search(&self, keyword: &str, page: PageRequest) -> Result<Page<product::Model>, ServiceError> {
        self.repo.search_active_products(keyword, page.normalize()).await
    }

    /// Inclusive price window over active products.
    #[instrument(skip(self))]
    pub async fn filter_by_price(&self, min: Decimal, max: Decimal, page: PageRequest) -> Result<Page<product::Model>, ServiceError> {
        if min > max {
            return Err(ServiceError::InvalidArgument("Minimum price cannot be greater than maximum price".into()));
        }
        self.repo.filter_active_products_by_price(min, max, page.normalize()).await
    }

    pub async fn list_by_category(&self, category_id: Uuid) -> Result<Vec<product::Model>, ServiceError> {
        if !self.repo.category_exists(category_id).await? {
            return Err(ServiceError::not_found("Category", category_id));
        }
        self.repo.list_active_products_in_category(category_id).await
    }

    #[instrument(skip(self), fields(%id))]
    pub async fn decrease_stock(&self, id: Uuid, quantity: i32) -> Result<product::Model, ServiceError> {
        reject_negative(quantity)?;
        let updated = match self.repo.decrease_stock(id, quantity).await {
            Ok(p) => p,
            Err(e @ ServiceError::InvalidArgument(_)) => {
                warn!(product_id = %id, quantity, "stock_decrease_rejected");
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        info!(product_id = %id, stock = updated.stock_quantity, "stock_decreased");
        Ok(updated)
    }

    /// Current names of the categories the given products belong to.
    pub async fn category_names(&self, products: &[product::Model]) -> Result<HashMap<Uuid, String>, ServiceError> {
        let mut names = HashMap::new();
        for p in products {
            if names.contains_key(&p.category_id) {
                continue;
            }
            if let Some(c) = self.repo.find_category(p.category_id).await? {
                names.insert(c.id, c.name);
            }
        }
        Ok(names)
    }

    #[instrument(skip(self), fields(%id))]
    pub async fn increase_stock(&self, id: Uuid, quantity: i32) -> Result<product::Model, ServiceError> {
        reject_negative(quantity)?;
        let updated = self.repo.increase_stock(id, quantity).await?;
        info!(product_id = %id, stock = updated.stock_quantity, "stock_increased");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::domain::{CategoryInput, ProductSortField, SortDirection};
    use crate::catalog::repo::MemoryCatalogRepository;
    use crate::catalog::CategoryService;

    struct Fixture {
        categories: CategoryService<MemoryCatalogRepository>,
        products: ProductService<MemoryCatalogRepository>,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(MemoryCatalogRepository::new());
        Fixture { categories: CategoryService::new(repo.clone()), products: ProductService::new(repo) }
    }

    async fn category(f: &Fixture, name: &str) -> Uuid {
        f.categories
            .create(CategoryInput { name: name.into(), description: "test category".into() })
            .await
            .expect("create category")
            .id
    }

    fn new_product(name: &str, price: i64, stock: i32, category_id: Uuid) -> NewProduct {
        NewProduct {
            name: name.into(),
            description: format!("{name} description"),
            price: Decimal::new(price, 2),
            stock_quantity: stock,
            category_id,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn category_names_follow_renames() -> Result<(), anyhow::Error> {
        let f = fixture();
        let kitchen = category(&f, "Kitchen").await;
        let garden = category(&f, "Garden").await;
        let kettle = f.products.create(new_product("Kettle", 3450, 1, kitchen)).await?;
        let toaster = f.products.create(new_product("Toaster", 2900, 1, kitchen)).await?;
        let rake = f.products.create(new_product("Rake", 1500, 1, garden)).await?;

        let names = f.products.category_names(&[kettle.clone(), toaster, rake]).await?;
        assert_eq!(names.len(), 2);
        assert_eq!(names[&kitchen], "Kitchen");
        assert_eq!(names[&garden], "Garden");

        f.categories
            .update(kitchen, CategoryInput { name: "Cookware".into(), description: "renamed".into() })
            .await?;
        let names = f.products.category_names(std::slice::from_ref(&kettle)).await?;
        assert_eq!(names[&kitchen], "Cookware");
        Ok(())
    }

    #[tokio::test]
    async fn create_then_get_round_trips() -> Result<(), anyhow::Error> {
        let f = fixture();
        let cid = category(&f, "Kitchen").await;
        let input = new_product("Kettle", 3450, 7, cid);
        let created = f.products.create(input.clone()).await?;
        let fetched = f.products.get_by_id(created.id).await?;
        assert_eq!(fetched, created);
        assert_eq!(fetched.name, input.name);
        assert_eq!(fetched.description, input.description);
        assert_eq!(fetched.price, input.price);
        assert_eq!(fetched.stock_quantity, 7);
        assert_eq!(fetched.category_id, cid);
        assert!(fetched.is_active);
        Ok(())
    }

    #[tokio::test]
    async fn create_with_deleted_category_is_not_found() -> Result<(), anyhow::Error> {
        let f = fixture();
        let cid = category(&f, "Ephemeral").await;
        f.categories.delete(cid).await?;
        let err = f.products.create(new_product("Ghost", 100, 1, cid)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m.starts_with("Category not found")));
        Ok(())
    }

    #[tokio::test]
    async fn update_keeps_omitted_fields_and_resolves_category() -> Result<(), anyhow::Error> {
        let f = fixture();
        let a = category(&f, "Alpha").await;
        let b = category(&f, "Beta").await;
        let p = f.products.create(new_product("Widget", 500, 2, a)).await?;

        let changes = ProductUpdate { price: Some(Decimal::new(750, 2)), category_id: Some(b), ..Default::default() };
        let updated = f.products.update(p.id, changes).await?;
        assert_eq!(updated.price, Decimal::new(750, 2));
        assert_eq!(updated.category_id, b);
        assert_eq!(updated.name, "Widget");
        assert_eq!(updated.stock_quantity, 2);

        let bad = ProductUpdate { category_id: Some(Uuid::new_v4()), ..Default::default() };
        assert!(matches!(f.products.update(p.id, bad).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(f.products.update(Uuid::new_v4(), ProductUpdate::default()).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn stock_never_goes_negative() -> Result<(), anyhow::Error> {
        let f = fixture();
        let cid = category(&f, "Stock").await;
        let p = f.products.create(new_product("Bolt", 25, 5, cid)).await?;

        let err = f.products.decrease_stock(p.id, 6).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(ref m) if m == "Insufficient stock for product: Bolt"));
        assert_eq!(f.products.get_by_id(p.id).await?.stock_quantity, 5);

        assert_eq!(f.products.decrease_stock(p.id, 5).await?.stock_quantity, 0);
        assert_eq!(f.products.increase_stock(p.id, 3).await?.stock_quantity, 3);
        assert!(matches!(f.products.decrease_stock(p.id, -1).await, Err(ServiceError::InvalidArgument(_))));
        assert!(matches!(f.products.increase_stock(p.id, i32::MAX).await, Err(ServiceError::InvalidArgument(_))));
        assert!(matches!(f.products.decrease_stock(Uuid::new_v4(), 1).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_decrements_respect_stock() -> Result<(), anyhow::Error> {
        let f = fixture();
        let cid = category(&f, "Race").await;
        let id = f.products.create(new_product("Ticket", 1000, 10, cid)).await?.id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let svc = f.products.clone();
                tokio::spawn(async move { svc.decrease_stock(id, 3).await })
            })
            .collect();
        let mut ok = 0;
        for h in handles {
            if h.await?.is_ok() { ok += 1; }
        }
        assert_eq!(ok, 3);
        assert_eq!(f.products.get_by_id(id).await?.stock_quantity, 1);
        Ok(())
    }

    #[tokio::test]
    async fn price_filter_validates_range_first() -> Result<(), anyhow::Error> {
        let f = fixture();
        let cid = category(&f, "Prices").await;
        for (name, cents) in [("Cheap item", 500), ("Middle item", 1500), ("Pricey item", 5000)] {
            f.products.create(new_product(name, cents, 1, cid)).await?;
        }
        let err = f.products.filter_by_price(Decimal::new(20, 0), Decimal::new(10, 0), PageRequest::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(ref m) if m == "Minimum price cannot be greater than maximum price"));

        let page = f.products.filter_by_price(Decimal::new(5, 0), Decimal::new(15, 0), PageRequest::default()).await?;
        let names: Vec<_> = page.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Cheap item", "Middle item"]);
        assert_eq!(page.total_count, 2);
        Ok(())
    }

    #[tokio::test]
    async fn listing_excludes_inactive_products() -> Result<(), anyhow::Error> {
        let f = fixture();
        let cid = category(&f, "Lights").await;
        f.products.create(new_product("Desk Lamp", 2000, 1, cid)).await?;
        f.products.create(new_product("Floor Lamp", 6000, 1, cid)).await?;
        let hidden = f.products.create(NewProduct { is_active: false, ..new_product("Lamp Shade", 900, 1, cid) }).await?;

        let found = f.products.search("LAMP", PageRequest::default()).await?;
        assert_eq!(found.total_count, 2);
        assert!(found.items.iter().all(|p| p.is_active));

        let by_cat = f.products.list_by_category(cid).await?;
        assert_eq!(by_cat.len(), 2);
        assert!(matches!(f.products.list_by_category(Uuid::new_v4()).await, Err(ServiceError::NotFound(_))));

        let sort = ProductSort { field: ProductSortField::Price, direction: SortDirection::Desc };
        let listed = f.products.list_active(PageRequest::new(0, 1), sort).await?;
        assert_eq!(listed.items[0].name, "Floor Lamp");
        assert_eq!(listed.total_pages(), 2);

        // inactive still reachable by id
        assert!(!f.products.get_by_id(hidden.id).await?.is_active);
        Ok(())
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() -> Result<(), anyhow::Error> {
        let f = fixture();
        let cid = category(&f, "Sale").await;
        f.products.create(new_product("50% off voucher", 100, 1, cid)).await?;
        f.products.create(new_product("500 points card", 100, 1, cid)).await?;
        let page = f.products.search("0%", PageRequest::default()).await?;
        assert_eq!(page.total_count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn delete_product_then_category() -> Result<(), anyhow::Error> {
        let f = fixture();
        let cid = category(&f, "Temp").await;
        let p = f.products.create(new_product("Thing", 100, 0, cid)).await?;
        assert!(matches!(f.categories.delete(cid).await, Err(ServiceError::Conflict(_))));
        f.products.delete(p.id).await?;
        assert!(matches!(f.products.delete(p.id).await, Err(ServiceError::NotFound(_))));
        f.categories.delete(cid).await?;
        Ok(())
    }
}
