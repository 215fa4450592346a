//! SeaORM data access for the catalog tables.
//!
//! Every read-then-write runs inside one transaction with the checked rows
//! locked; constraint violations reported by PostgreSQL are translated into
//! the matching `ServiceError`.

pub mod category_store;
pub mod product_store;

use sea_orm::{DbErr, SqlErr};

use crate::errors::ServiceError;

pub(crate) fn db_err(e: DbErr) -> ServiceError {
    ServiceError::db(e)
}

pub(crate) fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub(crate) fn is_foreign_key_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_)))
}
