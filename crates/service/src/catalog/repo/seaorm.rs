use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use models::{category, product};

use crate::catalog::domain::{CategoryInput, NewProduct, ProductSort, ProductUpdate};
use crate::catalog::repository::CatalogRepository;
use crate::db::{category_store, product_store};
use crate::errors::ServiceError;
use crate::pagination::{Page, PageRequest};

/// PostgreSQL-backed catalog store.
#[derive(Clone)]
pub struct SeaOrmCatalogRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmCatalogRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

#[async_trait]
impl CatalogRepository for SeaOrmCatalogRepository {
    async fn insert_category(&self, input: &CategoryInput) -> Result<category::Model, ServiceError> {
        category_store::insert_category(&self.db, input).await
    }

    async fn update_category(&self, id: Uuid, input: &CategoryInput) -> Result<category::Model, ServiceError> {
        category_store::update_category(&self.db, id, input).await
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, ServiceError> {
        category_store::delete_category(&self.db, id).await
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<category::Model>, ServiceError> {
        category_store::find_category(&self.db, id).await
    }

    async fn category_exists(&self, id: Uuid) -> Result<bool, ServiceError> {
        category_store::category_exists(&self.db, id).await
    }

    async fn category_name_exists(&self, name: &str) -> Result<bool, ServiceError> {
        category_store::category_name_exists(&self.db, name).await
    }

    async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        category_store::list_categories(&self.db).await
    }

    async fn count_products_in_category(&self, category_id: Uuid) -> Result<u64, ServiceError> {
        category_store::count_products_in_category(&self.db, category_id).await
    }

    async fn insert_product(&self, input: &NewProduct) -> Result<product::Model, ServiceError> {
        product_store::insert_product(&self.db, input).await
    }

    async fn update_product(&self, id: Uuid, changes: &ProductUpdate) -> Result<product::Model, ServiceError> {
        product_store::update_product(&self.db, id, changes).await
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, ServiceError> {
        product_store::delete_product(&self.db, id).await
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<product::Model>, ServiceError> {
        product_store::find_product(&self.db, id).await
    }

    async fn list_active_products(&self, page: PageRequest, sort: ProductSort) -> Result<Page<product::Model>, ServiceError> {
        product_store::list_active_products(&self.db, page, sort).await
    }

    async fn search_active_products(&self, keyword: &str, page: PageRequest) -> Result<Page<product::Model>, ServiceError> {
        product_store::search_active_products(&self.db, keyword, page).await
    }

    async fn filter_active_products_by_price(&self, min: Decimal, max: Decimal, page: PageRequest) -> Result<Page<product::Model>, ServiceError> {
        product_store::filter_active_products_by_price(&self.db, min, max, page).await
    }

    async fn list_active_products_in_category(&self, category_id: Uuid) -> Result<Vec<product::Model>, ServiceError> {
        product_store::list_active_products_in_category(&self.db, category_id).await
    }

    async fn decrease_stock(&self, id: Uuid, quantity: i32) -> Result<product::Model, ServiceError> {
        product_store::decrease_stock(&self.db, id, quantity).await
    }

    async fn increase_stock(&self, id: Uuid, quantity: i32) -> Result<product::Model, ServiceError> {
        product_store::increase_stock(&self.db, id, quantity).await
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use super::*;
    use crate::catalog::CategoryService;
    use crate::test_support::get_db;

    fn category_input(name: &str) -> CategoryInput {
        CategoryInput { name: name.into(), description: "db backed".into() }
    }

    #[tokio::test]
    async fn store_enforces_name_and_reference_rules() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = SeaOrmCatalogRepository::new(db);

        let name = format!("Cat_{}", Uuid::new_v4());
        let cat = repo.insert_category(&category_input(&name)).await?;
        let dup = repo.insert_category(&category_input(&name.to_uppercase())).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));

        let product_name = format!("Db product {}", Uuid::new_v4());
        let product = repo
            .insert_product(&NewProduct {
                name: product_name.clone(),
                description: "stored in postgres".into(),
                price: Decimal::new(1250, 2),
                stock_quantity: 4,
                category_id: cat.id,
                is_active: true,
            })
            .await?;
        assert!(matches!(repo.delete_category(cat.id).await, Err(ServiceError::Conflict(_))));

        assert!(matches!(repo.decrease_stock(product.id, 5).await, Err(ServiceError::InvalidArgument(_))));
        assert_eq!(repo.decrease_stock(product.id, 4).await?.stock_quantity, 0);

        let found = repo.search_active_products(&product_name.to_uppercase(), PageRequest::default()).await?;
        assert_eq!(found.total_count, 1);
        assert_eq!(found.items[0].id, product.id);

        assert!(repo.delete_product(product.id).await?);
        assert!(repo.delete_category(cat.id).await?);
        assert!(!repo.delete_category(cat.id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn orphan_product_is_not_found() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = SeaOrmCatalogRepository::new(db);
        let missing = Uuid::new_v4();
        let res = repo
            .insert_product(&NewProduct {
                name: "Orphan".into(),
                description: "no category at all".into(),
                price: Decimal::ONE,
                stock_quantity: 0,
                category_id: missing,
                is_active: true,
            })
            .await;
        assert!(matches!(res, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    fn product_input(category_id: Uuid, price: Decimal, stock: i32) -> NewProduct {
        NewProduct {
            name: format!("Db product {}", Uuid::new_v4()),
            description: "stored in postgres".into(),
            price,
            stock_quantity: stock,
            category_id,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn accepted_prices_round_trip_exactly() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = SeaOrmCatalogRepository::new(db);
        let cat = repo.insert_category(&category_input(&format!("Price_{}", Uuid::new_v4()))).await?;

        for raw in ["0.0001", "1.2345", "19.99", "999999999999999.9999"] {
            let price = Decimal::from_str(raw)?;
            assert!(models::product::validate_price(&price).is_ok(), "{raw}");
            let created = repo.insert_product(&product_input(cat.id, price, 1)).await?;
            assert_eq!(created.price, price, "{raw}");
            let fetched = repo.find_product(created.id).await?.expect("stored");
            assert_eq!(fetched.price, price, "{raw}");
            repo.delete_product(created.id).await?;
        }
        repo.delete_category(cat.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn lengthening_lowercase_name_fits_the_key_column() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = SeaOrmCatalogRepository::new(db);

        // unique per run; 'İ' lower-cases to two chars
        let tag = Uuid::new_v4().simple().to_string();
        let name = format!("{}{}", "İ".repeat(50 - tag.len()), tag);
        assert!(models::category::validate_name(&name).is_ok());
        assert!(models::category::name_key(&name).chars().count() > 50);

        let cat = repo.insert_category(&category_input(&name)).await?;
        assert_eq!(cat.name, name);
        assert!(repo.category_name_exists(&name).await?);
        assert!(repo.delete_category(cat.id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn huge_page_index_returns_an_empty_page() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = SeaOrmCatalogRepository::new(db);

        let page = repo.list_active_products(PageRequest::new(u64::MAX / 2, 10), ProductSort::default()).await?;
        assert!(page.items.is_empty());
        let page = repo.search_active_products("anything", PageRequest::new(u64::MAX, 100)).await?;
        assert!(page.items.is_empty());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_decrements_respect_stock() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = Arc::new(SeaOrmCatalogRepository::new(db));
        let cat = repo.insert_category(&category_input(&format!("Stock_{}", Uuid::new_v4()))).await?;
        let product = repo.insert_product(&product_input(cat.id, Decimal::ONE, 10)).await?;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = repo.clone();
            let id = product.id;
            handles.push(tokio::spawn(async move { repo.decrease_stock(id, 3).await }));
        }
        let mut succeeded = 0;
        for h in handles {
            match h.await? {
                Ok(_) => succeeded += 1,
                Err(ServiceError::InvalidArgument(_)) => {}
                Err(other) => panic!("unexpected: {other:?}"),
            }
        }
        assert_eq!(succeeded, 3);
        assert_eq!(repo.find_product(product.id).await?.expect("stored").stock_quantity, 1);

        repo.delete_product(product.id).await?;
        repo.delete_category(cat.id).await?;
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_admit_one_name() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = Arc::new(SeaOrmCatalogRepository::new(db));
        let service = CategoryService::new(repo.clone());
        let name = format!("Race_{}", Uuid::new_v4().simple());

        let mut handles = Vec::new();
        for i in 0..8 {
            let service = service.clone();
            // alternate case so only the lower-cased key collides
            let name = if i % 2 == 0 { name.clone() } else { name.to_uppercase() };
            handles.push(tokio::spawn(async move { service.create(category_input(&name)).await }));
        }
        let mut created = Vec::new();
        for h in handles {
            match h.await? {
                Ok(c) => created.push(c),
                Err(ServiceError::Conflict(_)) => {}
                Err(other) => panic!("unexpected: {other:?}"),
            }
        }
        assert_eq!(created.len(), 1);
        assert!(repo.delete_category(created[0].id).await?);
        Ok(())
    }
}
