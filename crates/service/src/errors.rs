use std::fmt::Display;

use thiserror::Error;

/// Outcome of a catalog operation that did not succeed.
///
/// `NotFound`, `Conflict` and `InvalidArgument` are expected business
/// outcomes; `Db` covers everything unclassified and must not be shown to
/// API callers verbatim.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("database error: {0}")]
    Db(String),
}

impl ServiceError {
    pub fn not_found(entity: &str, id: impl Display) -> Self {
        Self::NotFound(format!("{} not found with id: {}", entity, id))
    }

    pub fn duplicate_category_name(name: &str) -> Self {
        Self::Conflict(format!("Category with name '{}' already exists", name))
    }

    pub fn category_has_products() -> Self {
        Self::Conflict("Cannot delete category with existing products".into())
    }

    pub fn insufficient_stock(product_name: &str) -> Self {
        Self::InvalidArgument(format!("Insufficient stock for product: {}", product_name))
    }

    pub fn db(e: impl Display) -> Self { Self::Db(e.to_string()) }

    /// Message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            ServiceError::NotFound(m)
            | ServiceError::Conflict(m)
            | ServiceError::InvalidArgument(m)
            | ServiceError::Db(m) => m,
        }
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::NotFound(_) => 2001,
            ServiceError::Conflict(_) => 2002,
            ServiceError::InvalidArgument(_) => 2003,
            ServiceError::Db(_) => 2100,
        }
    }
}
