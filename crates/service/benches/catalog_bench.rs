use criterion::{criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use std::sync::Arc;

use service::auth::{AuthConfig, AuthService, domain::LoginInput, repository::InMemoryUserDirectory};
use service::catalog::domain::{CategoryInput, NewProduct};
use service::catalog::repo::MemoryCatalogRepository;
use service::catalog::{CategoryService, ProductService};
use service::pagination::PageRequest;

fn bench_search(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let repo = Arc::new(MemoryCatalogRepository::new());
    let categories = CategoryService::new(repo.clone());
    let products = ProductService::new(repo);

    // seed outside of the measured loop
    rt.block_on(async {
        let cat = categories
            .create(CategoryInput { name: "Bench".into(), description: "bench data".into() })
            .await
            .unwrap();
        for i in 0..1_000 {
            let input = NewProduct {
                name: format!("Item {i} lamp"),
                description: "benchmark product".into(),
                price: Decimal::new(100 + i, 2),
                stock_quantity: 10,
                category_id: cat.id,
                is_active: i % 7 != 0,
            };
            products.create(input).await.unwrap();
        }
    });

    c.bench_function("memory_search_keyword", |b| {
        b.iter(|| rt.block_on(products.search("LAMP", PageRequest::new(3, 20))).unwrap());
    });
    c.bench_function("memory_filter_price", |b| {
        b.iter(|| {
            rt.block_on(products.filter_by_price(Decimal::new(2, 0), Decimal::new(8, 0), PageRequest::default())).unwrap()
        });
    });
}

fn bench_login(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = Arc::new(InMemoryUserDirectory::seeded().unwrap());
    let svc = AuthService::new(dir, AuthConfig { jwt_secret: "secret".into(), token_ttl_secs: 3600 });

    c.bench_function("auth_login_verify", |b| {
        b.iter(|| {
            let session = rt.block_on(svc.login(LoginInput { username: "user".into(), password: "user123".into() })).unwrap();
            svc.verify(&session.access_token).unwrap()
        });
    });
}

criterion_group!(benches, bench_search, bench_login);
criterion_main!(benches);
