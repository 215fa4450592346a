use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{errors::{FieldErrors, ModelError}, product};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    /// Lower-cased `name`; carries the unique constraint.
    #[serde(skip)]
    #[sea_orm(column_type = "Text")]
    pub name_key: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Product }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Product => Entity::has_many(product::Entity).into(),
        }
    }
}

impl Related<product::Entity> for Entity {
    fn to() -> RelationDef { Relation::Product.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Key under which names are compared for uniqueness.
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() {
        return Err(ModelError::validation("name", "Category name is required"));
    }
    let len = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Err(ModelError::validation(
            "name",
            format!("Category name must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"),
        ));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), ModelError> {
    if description.trim().is_empty() {
        return Err(ModelError::validation("description", "Description is required"));
    }
    Ok(())
}

/// Validate every category field, reporting all failures at once.
pub fn validate(name: &str, description: &str) -> Result<(), ModelError> {
    let mut errs = FieldErrors::default();
    errs.check(validate_name(name));
    errs.check(validate_description(description));
    errs.into_result()
}
