use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::validate;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub price: Decimal,
    pub stock: i32,
    pub reserved_stock: i32,
    pub is_active: bool,
    pub category_id: Uuid,
    pub company_id: Uuid,
    pub tax_id: Option<Uuid>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::category::Entity",
        from = "Column::CategoryId",
        to = "crate::category::Column::Id"
    )]
    Category,
    #[sea_orm(
        belongs_to = "crate::company::Entity",
        from = "Column::CompanyId",
        to = "crate::company::Column::Id"
    )]
    Company,
    #[sea_orm(
        belongs_to = "crate::tax::Entity",
        from = "Column::TaxId",
        to = "crate::tax::Column::Id"
    )]
    Tax,
}

impl Related<crate::category::Entity> for Entity {
    fn to() -> RelationDef { Relation::Category.def() }
}

impl Related<crate::company::Entity> for Entity {
    fn to() -> RelationDef { Relation::Company.def() }
}

impl Related<crate::tax::Entity> for Entity {
    fn to() -> RelationDef { Relation::Tax.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn stock_state(&self) -> Stock {
        Stock { on_hand: self.stock, reserved: self.reserved_stock }
    }
}

pub fn validate_sku(sku: &str) -> Result<String, ModelError> {
    validate::code("sku", sku, 1, 64, |c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn validate_name(name: &str) -> Result<String, ModelError> {
    validate::text("name", name, 2, 150)
}

pub fn validate_description(description: Option<&str>) -> Result<Option<String>, ModelError> {
    validate::optional_text("description", description, 2000)
}

pub fn validate_price(price: Decimal) -> Result<Decimal, ModelError> {
    if price <= Decimal::ZERO {
        return Err(ModelError::Validation("price must be greater than zero".into()));
    }
    validate::max_scale("price", price, 2)?;
    validate::money("price", price)
}

pub fn validate_initial_stock(stock: i32) -> Result<i32, ModelError> {
    if stock < 0 {
        return Err(ModelError::Validation("stock must be >= 0".into()));
    }
    Ok(stock)
}

/// A stock movement requested against one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "quantity")]
pub enum StockOp {
    Reserve(i32),
    Release(i32),
    Commit(i32),
    Adjust(i32),
}

impl StockOp {
    pub fn name(&self) -> &'static str {
        match self {
            StockOp::Reserve(_) => "reserve",
            StockOp::Release(_) => "release",
            StockOp::Commit(_) => "commit",
            StockOp::Adjust(_) => "adjust",
        }
    }
}

/// On-hand and reserved quantities of a product.
///
/// Invariant: `0 <= reserved <= on_hand`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stock {
    pub on_hand: i32,
    pub reserved: i32,
}

impl Stock {
    pub fn available(&self) -> i32 { self.on_hand - self.reserved }

    pub fn reserve(self, qty: i32) -> Result<Self, ModelError> {
        positive(qty)?;
        if qty > self.available() {
            return Err(ModelError::InvalidState(format!(
                "cannot reserve {qty}: only {} available",
                self.available()
            )));
        }
        Ok(Stock { reserved: self.reserved + qty, ..self })
    }

    pub fn release(self, qty: i32) -> Result<Self, ModelError> {
        positive(qty)?;
        if qty > self.reserved {
            return Err(ModelError::InvalidState(format!(
                "cannot release {qty}: only {} reserved",
                self.reserved
            )));
        }
        Ok(Stock { reserved: self.reserved - qty, ..self })
    }

    /// Consume previously reserved units.
    pub fn commit(self, qty: i32) -> Result<Self, ModelError> {
        positive(qty)?;
        if qty > self.reserved {
            return Err(ModelError::InvalidState(format!(
                "cannot commit {qty}: only {} reserved",
                self.reserved
            )));
        }
        Ok(Stock { on_hand: self.on_hand - qty, reserved: self.reserved - qty })
    }

    pub fn adjust(self, delta: i32) -> Result<Self, ModelError> {
        if delta == 0 {
            return Err(ModelError::InvalidState("stock adjustment must be non-zero".into()));
        }
        let on_hand = self
            .on_hand
            .checked_add(delta)
            .ok_or_else(|| ModelError::InvalidState(format!("stock adjustment {delta} overflows")))?;
        if on_hand < 0 || on_hand < self.reserved {
            return Err(ModelError::InvalidState(format!(
                "cannot adjust by {delta}: stock would drop below {} reserved",
                self.reserved
            )));
        }
        Ok(Stock { on_hand, ..self })
    }

    pub fn apply(self, op: StockOp) -> Result<Self, ModelError> {
        match op {
            StockOp::Reserve(q) => self.reserve(q),
            StockOp::Release(q) => self.release(q),
            StockOp::Commit(q) => self.commit(q),
            StockOp::Adjust(d) => self.adjust(d),
        }
    }
}

fn positive(qty: i32) -> Result<(), ModelError> {
    if qty <= 0 {
        return Err(ModelError::InvalidState(format!("quantity {qty} must be positive")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn stock(on_hand: i32, reserved: i32) -> Stock { Stock { on_hand, reserved } }

    #[test]
    fn reserve_within_available() {
        let s = stock(10, 4).reserve(6).unwrap();
        assert_eq!(s, stock(10, 10));
        assert_eq!(s.available(), 0);
        assert!(matches!(stock(10, 4).reserve(7), Err(ModelError::InvalidState(_))));
    }

    #[test]
    fn release_and_commit_bounded_by_reserved() {
        assert_eq!(stock(10, 4).release(4).unwrap(), stock(10, 0));
        assert!(stock(10, 4).release(5).is_err());
        assert_eq!(stock(10, 4).commit(3).unwrap(), stock(7, 1));
        assert!(stock(10, 4).commit(5).is_err());
    }

    #[test]
    fn non_positive_quantities_rejected() {
        assert!(stock(10, 0).reserve(0).is_err());
        assert!(stock(10, 2).release(-1).is_err());
        assert!(stock(10, 2).commit(0).is_err());
    }

    #[test]
    fn adjust_keeps_reserved_covered() {
        assert_eq!(stock(10, 4).adjust(5).unwrap(), stock(15, 4));
        assert_eq!(stock(10, 4).adjust(-6).unwrap(), stock(4, 4));
        assert!(stock(10, 4).adjust(-7).is_err());
        assert!(stock(10, 0).adjust(-11).is_err());
        assert!(stock(10, 0).adjust(0).is_err());
    }

    #[test]
    fn apply_dispatches() {
        assert_eq!(stock(5, 0).apply(StockOp::Reserve(2)).unwrap(), stock(5, 2));
        assert_eq!(StockOp::Adjust(3).name(), "adjust");
    }

    #[test]
    fn sku_and_price_validation() {
        assert_eq!(validate_sku("abc-01_x").unwrap(), "ABC-01_X");
        assert!(validate_sku("abc 01").is_err());
        assert!(validate_price(Decimal::ZERO).is_err());
        assert!(validate_price(Decimal::from_str("9.99").unwrap()).is_ok());
        assert!(validate_price(Decimal::from_str("9.999").unwrap()).is_err());
        assert!(validate_price(Decimal::from_str("999999999999.99").unwrap()).is_ok());
        assert!(validate_price(Decimal::from_str("1000000000000.00").unwrap()).is_err());
        assert!(validate_initial_stock(-1).is_err());
    }
}
