use std::sync::Arc;

use service::auth::repository::{InMemoryUserDirectory, UserDirectory};
use service::auth::{AuthConfig, AuthService};
use service::catalog::repo::MemoryCatalogRepository;
use service::catalog::{CatalogRepository, CategoryService, ProductService};

/// Shared handler state; cheap to clone.
#[derive(Clone)]
pub struct ServerState {
    pub categories: CategoryService<dyn CatalogRepository>,
    pub products: ProductService<dyn CatalogRepository>,
    pub auth: Arc<AuthService<dyn UserDirectory>>,
    pub expose_dev_credentials: bool,
}

impl ServerState {
    pub fn new(repo: Arc<dyn CatalogRepository>, auth: AuthService<dyn UserDirectory>, expose_dev_credentials: bool) -> Self {
        Self {
            categories: CategoryService::new(repo.clone()),
            products: ProductService::new(repo),
            auth: Arc::new(auth),
            expose_dev_credentials,
        }
    }

    /// State over the in-memory store and the seeded dev users.
    pub fn in_memory(cfg: &configs::AuthConfig) -> Result<Self, service::auth::errors::AuthError> {
        let repo: Arc<dyn CatalogRepository> = Arc::new(MemoryCatalogRepository::new());
        Ok(Self::new(repo, dev_auth(cfg)?, cfg.expose_dev_credentials))
    }
}

pub fn dev_auth(cfg: &configs::AuthConfig) -> Result<AuthService<dyn UserDirectory>, service::auth::errors::AuthError> {
    let users: Arc<dyn UserDirectory> = Arc::new(InMemoryUserDirectory::seeded()?);
    Ok(AuthService::new(users, AuthConfig { jwt_secret: cfg.jwt_secret.clone(), token_ttl_secs: cfg.token_ttl_secs }))
}
