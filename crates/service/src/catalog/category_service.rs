use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use models::category;

use super::domain::CategoryInput;
use super::repository::CatalogRepository;
use crate::errors::ServiceError;

/// Category business rules on top of a [`CatalogRepository`].
pub struct CategoryService<R: CatalogRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: CatalogRepository + ?Sized> Clone for CategoryService<R> {
    fn clone(&self) -> Self { Self { repo: self.repo.clone() } }
}

impl<R: CatalogRepository + ?Sized> CategoryService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    /// Create a category whose name is unique ignoring case.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::catalog::{CategoryService, domain::CategoryInput, repo::MemoryCatalogRepository};
    /// let svc = CategoryService::new(Arc::new(MemoryCatalogRepository::new()));
    /// let input = CategoryInput { name: "Books".into(), description: "Printed matter".into() };
    /// let created = tokio_test::block_on(svc.create(input.clone())).unwrap();
    /// assert_eq!(created.name, "Books");
    /// assert!(tokio_test::block_on(svc.create(input)).is_err());
    /// ```
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CategoryInput) -> Result<category::Model, ServiceError> {
        if self.repo.category_name_exists(&input.name).await? {
            return Err(ServiceError::duplicate_category_name(&input.name));
        }
        let created = self.repo.insert_category(&input).await?;
        info!(category_id = %created.id, name = %created.name, "category_created");
        Ok(created)
    }

    #[instrument(skip(self, input), fields(%id, name = %input.name))]
    pub async fn update(&self, id: Uuid, input: CategoryInput) -> Result<category::Model, ServiceError> {
        let existing = self.get_by_id(id).await?;
        if category::name_key(&existing.name) != category::name_key(&input.name)
            && self.repo.category_name_exists(&input.name).await?
        {
            return Err(ServiceError::duplicate_category_name(&input.name));
        }
        let updated = self.repo.update_category(id, &input).await?;
        info!(category_id = %updated.id, "category_updated");
        Ok(updated)
    }

    /// Remove a category that no product references.
    #[instrument(skip(self), fields(%id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.get_by_id(id).await?;
        let products = self.repo.count_products_in_category(id).await?;
        if products > 0 {
            debug!(products, "category still referenced");
            return Err(ServiceError::category_has_products());
        }
        // the store re-checks under its own lock; false means it vanished meanwhile
        if !self.repo.delete_category(id).await? {
            return Err(ServiceError::not_found("Category", id));
        }
        info!(category_id = %id, "category_deleted");
        Ok(())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<category::Model, ServiceError> {
        self.repo
            .find_category(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))
    }

    pub async fn list_all(&self) -> Result<Vec<category::Model>, ServiceError> {
        self.repo.list_categories().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::domain::NewProduct;
    use crate::catalog::repo::MemoryCatalogRepository;
    use rust_decimal::Decimal;

    fn input(name: &str) -> CategoryInput {
        CategoryInput { name: name.into(), description: format!("{name} things") }
    }

    fn service() -> (Arc<MemoryCatalogRepository>, CategoryService<MemoryCatalogRepository>) {
        let repo = Arc::new(MemoryCatalogRepository::new());
        (repo.clone(), CategoryService::new(repo))
    }

    #[tokio::test]
    async fn duplicate_name_ignores_case() -> Result<(), anyhow::Error> {
        let (_, svc) = service();
        svc.create(input("Electronics")).await?;
        let err = svc.create(input("electronics")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == "Category with name 'electronics' already exists"));
        assert_eq!(svc.list_all().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn update_rechecks_name_only_when_it_changes() -> Result<(), anyhow::Error> {
        let (_, svc) = service();
        let books = svc.create(input("Books")).await?;
        svc.create(input("Games")).await?;

        // case-only rename of itself is allowed
        let renamed = svc.update(books.id, input("BOOKS")).await?;
        assert_eq!(renamed.name, "BOOKS");
        assert_eq!(renamed.description, "BOOKS things");

        let err = svc.update(books.id, input("games")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err = svc.update(Uuid::new_v4(), input("Music")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        Ok(())
    }

    #[tokio::test]
    async fn store_update_checks_existence_before_name() -> Result<(), anyhow::Error> {
        let (repo, svc) = service();
        let toys = svc.create(input("Toys")).await?;

        let err = repo.update_category(Uuid::new_v4(), &input("TOYS")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        svc.create(input("Tools")).await?;
        let err = repo.update_category(toys.id, &input("tools")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        Ok(())
    }

    #[tokio::test]
    async fn delete_is_blocked_by_products() -> Result<(), anyhow::Error> {
        let (repo, svc) = service();
        let cat = svc.create(input("Garden")).await?;
        let product = repo
            .insert_product(&NewProduct {
                name: "Rake".into(),
                description: "Steel garden rake".into(),
                price: Decimal::new(1999, 2),
                stock_quantity: 3,
                category_id: cat.id,
                is_active: false,
            })
            .await?;

        let err = svc.delete(cat.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == "Cannot delete category with existing products"));

        assert!(repo.delete_product(product.id).await?);
        svc.delete(cat.id).await?;
        assert!(matches!(svc.get_by_id(cat.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found() {
        let (_, svc) = service();
        let id = Uuid::new_v4();
        match svc.delete(id).await {
            Err(ServiceError::NotFound(m)) => assert_eq!(m, format!("Category not found with id: {id}")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn concurrent_creates_admit_one_name() {
        let (_, svc) = service();
        let handles: Vec<_> = ["Toys", "TOYS", "toys", "ToYs"]
            .into_iter()
            .map(|n| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.create(input(n)).await })
            })
            .collect();
        let mut ok = 0;
        for h in handles {
            if h.await.expect("join").is_ok() { ok += 1; }
        }
        assert_eq!(ok, 1);
    }
}
