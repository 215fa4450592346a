use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fields of a category as supplied on create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub description: String,
}

/// Product creation input; `category_id` must resolve at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category_id: Uuid,
    pub is_active: bool,
}

/// Partial product update: `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub category_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool { *self == Self::default() }

    /// Apply every supplied field onto `target`.
    pub fn apply_to(&self, target: &mut models::product::Model) {
        if let Some(v) = &self.name { target.name = v.clone(); }
        if let Some(v) = &self.description { target.description = v.clone(); }
        if let Some(v) = self.price { target.price = v; }
        if let Some(v) = self.stock_quantity { target.stock_quantity = v; }
        if let Some(v) = self.category_id { target.category_id = v; }
        if let Some(v) = self.is_active { target.is_active = v; }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSortField {
    #[default]
    Name,
    Price,
    StockQuantity,
    CreatedAt,
    UpdatedAt,
}

impl ProductSortField {
    /// Parse a wire field name (`stockQuantity` and `stock_quantity` both accepted).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "").as_str() {
            "name" => Some(Self::Name),
            "price" => Some(Self::Price),
            "stockquantity" => Some(Self::StockQuantity),
            "createdat" => Some(Self::CreatedAt),
            "updatedat" => Some(Self::UpdatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProductSort {
    pub field: ProductSortField,
    pub direction: SortDirection,
}
