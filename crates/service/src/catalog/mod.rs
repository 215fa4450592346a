//! Catalog module: domain inputs, the storage contract, its implementations,
//! and the category/product services that enforce business rules on top.

pub mod domain;
pub mod repository;
pub mod repo;
pub mod category_service;
pub mod product_service;

pub use category_service::CategoryService;
pub use product_service::ProductService;
pub use repository::CatalogRepository;
