//! SeaORM entities for the catalog plus the shape rules the request layer
//! applies before anything reaches the service layer.

pub mod errors;
pub mod db;
pub mod category;
pub mod product;

#[cfg(test)]
mod tests;
