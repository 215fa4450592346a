use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{category, errors::ModelError};

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MIN_CHARS: usize = 10;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
/// Fractional digits kept by the `NUMERIC(19, 4)` price column.
pub const PRICE_MAX_SCALE: u32 = 4;
/// Integer digits left for a price once the fraction is reserved.
pub const PRICE_MAX_INTEGER_DIGITS: u32 = 15;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Category }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Category => Entity::belongs_to(category::Entity)
                .from(Column::CategoryId)
                .to(category::Column::Id)
                .into(),
        }
    }
}

impl Related<category::Entity> for Entity {
    fn to() -> RelationDef { Relation::Category.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() {
        return Err(ModelError::validation("name", "Product name is required"));
    }
    let len = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Err(ModelError::validation(
            "name",
            format!("Product name must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"),
        ));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), ModelError> {
    if description.trim().is_empty() {
        return Err(ModelError::validation("description", "Description is required"));
    }
    let len = description.chars().count();
    if !(DESCRIPTION_MIN_CHARS..=DESCRIPTION_MAX_CHARS).contains(&len) {
        return Err(ModelError::validation(
            "description",
            format!("Description must be between {DESCRIPTION_MIN_CHARS} and {DESCRIPTION_MAX_CHARS} characters"),
        ));
    }
    Ok(())
}

pub fn validate_price(price: &Decimal) -> Result<(), ModelError> {
    if *price <= Decimal::ZERO {
        return Err(ModelError::validation("price", "Price must be greater than 0"));
    }
    if price.normalize().scale() > PRICE_MAX_SCALE {
        return Err(ModelError::validation(
            "price",
            format!("Price can have at most {PRICE_MAX_SCALE} decimal places"),
        ));
    }
    if *price >= Decimal::from(10_i64.pow(PRICE_MAX_INTEGER_DIGITS)) {
        return Err(ModelError::validation(
            "price",
            format!("Price can have at most {PRICE_MAX_INTEGER_DIGITS} integer digits"),
        ));
    }
    Ok(())
}

pub fn validate_stock_quantity(quantity: i32) -> Result<(), ModelError> {
    if quantity < 0 {
        return Err(ModelError::validation("stockQuantity", "Stock quantity cannot be negative"));
    }
    Ok(())
}
