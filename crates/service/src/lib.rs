//! Service layer providing the catalog business rules on top of models.
//! - Separates business logic from data access (`CatalogRepository`).
//! - Reuses validation and entity definitions in `models` crate.
//! - Provides clear error types and documented interfaces.

pub mod errors;
pub mod pagination;
pub mod catalog;
pub mod db;
pub mod auth;
#[cfg(test)]
pub mod test_support;
