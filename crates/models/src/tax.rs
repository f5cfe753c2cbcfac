use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::validate;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tax")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub code: String,
    pub name: String,
    /// Percentage applied to an item subtotal.
    #[sea_orm(column_type = "Decimal(Some((7, 4)))")]
    pub rate: Decimal,
    pub description: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::product::Entity")]
    Product,
}

impl Related<crate::product::Entity> for Entity {
    fn to() -> RelationDef { Relation::Product.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_code(code: &str) -> Result<String, ModelError> {
    validate::code("code", code, 2, 20, |c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

pub fn validate_name(name: &str) -> Result<String, ModelError> {
    validate::text("name", name, 2, 100)
}

pub fn validate_rate(rate: Decimal) -> Result<Decimal, ModelError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(ModelError::Validation("rate must be within 0..=100".into()));
    }
    validate::max_scale("rate", rate, 4)
}

pub fn validate_description(description: Option<&str>) -> Result<Option<String>, ModelError> {
    validate::optional_text("description", description, 500)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn code_is_upper_cased() {
        assert_eq!(validate_code("icms_sp").unwrap(), "ICMS_SP");
        assert!(validate_code("I").is_err());
        assert!(validate_code("IC-MS").is_err());
    }

    #[test]
    fn rate_bounds_and_scale() {
        assert!(validate_rate(Decimal::ZERO).is_ok());
        assert!(validate_rate(Decimal::ONE_HUNDRED).is_ok());
        assert!(validate_rate(Decimal::from_str("18.0725").unwrap()).is_ok());
        assert!(validate_rate(Decimal::from_str("18.07251").unwrap()).is_err());
        assert!(validate_rate(Decimal::from_str("-0.01").unwrap()).is_err());
        assert!(validate_rate(Decimal::from_str("100.01").unwrap()).is_err());
    }
}
