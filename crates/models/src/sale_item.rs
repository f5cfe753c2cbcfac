use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::validate;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sale_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub unit_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((7, 4)))")]
    pub tax_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub tax_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub total: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::sale::Entity",
        from = "Column::SaleId",
        to = "crate::sale::Column::Id",
        on_delete = "Cascade"
    )]
    Sale,
    #[sea_orm(
        belongs_to = "crate::product::Entity",
        from = "Column::ProductId",
        to = "crate::product::Column::Id"
    )]
    Product,
}

impl Related<crate::sale::Entity> for Entity {
    fn to() -> RelationDef { Relation::Sale.def() }
}

impl Related<crate::product::Entity> for Entity {
    fn to() -> RelationDef { Relation::Product.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Money columns of one line, computed from a price and tax snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePricing {
    pub quantity: i32,
    pub unit_price: Decimal,
    pub tax_rate: Decimal,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl LinePricing {
    pub fn compute(quantity: i32, unit_price: Decimal, tax_rate: Decimal) -> Result<Self, ModelError> {
        if quantity <= 0 {
            return Err(ModelError::Validation("item quantity must be positive".into()));
        }
        let subtotal = unit_price
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(|| ModelError::Validation("item subtotal is out of range".into()))?;
        let subtotal = validate::money("item subtotal", subtotal)?;
        let tax_amount = round_money(subtotal * tax_rate / Decimal::ONE_HUNDRED);
        Ok(LinePricing {
            quantity,
            unit_price,
            tax_rate,
            subtotal,
            tax_amount,
            total: validate::money("item total", subtotal + tax_amount)?,
        })
    }
}

/// Sums of the item columns, stored on the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub total: Decimal,
}

impl Totals {
    /// Fails when a sum would not fit the sale's money columns.
    pub fn of<'a>(lines: impl IntoIterator<Item = &'a LinePricing>) -> Result<Self, ModelError> {
        let sums = lines.into_iter().fold(Totals::default(), |acc, l| Totals {
            subtotal: acc.subtotal + l.subtotal,
            tax_total: acc.tax_total + l.tax_amount,
            total: acc.total + l.total,
        });
        validate::money("sale subtotal", sums.subtotal)?;
        validate::money("sale tax total", sums.tax_total)?;
        validate::money("sale total", sums.total)?;
        Ok(sums)
    }
}

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal { Decimal::from_str(s).unwrap() }

    #[test]
    fn computes_line_with_tax() {
        let l = LinePricing::compute(3, d("10.00"), d("18")).unwrap();
        assert_eq!(l.subtotal, d("30.00"));
        assert_eq!(l.tax_amount, d("5.40"));
        assert_eq!(l.total, d("35.40"));
    }

    #[test]
    fn tax_rounds_half_away_from_zero() {
        // 0.25 * 1 * 10% = 0.025
        let l = LinePricing::compute(1, d("0.25"), d("10")).unwrap();
        assert_eq!(l.tax_amount, d("0.03"));
        let l = LinePricing::compute(1, d("0.24"), d("10")).unwrap();
        assert_eq!(l.tax_amount, d("0.02"));
    }

    #[test]
    fn zero_quantity_rejected() {
        assert!(LinePricing::compute(0, d("1"), Decimal::ZERO).is_err());
    }

    #[test]
    fn amounts_beyond_the_money_column_are_validation_errors() {
        // 12 integer digits fit, a 13th does not
        assert!(LinePricing::compute(1, d("999999999999.99"), Decimal::ZERO).is_ok());
        let over = LinePricing::compute(2, d("600000000000.00"), Decimal::ZERO);
        assert!(matches!(over, Err(ModelError::Validation(_))));
        let taxed = LinePricing::compute(1, d("999999999999.00"), d("10"));
        assert!(matches!(taxed, Err(ModelError::Validation(_))));

        let half = LinePricing::compute(1, d("600000000000.00"), Decimal::ZERO).unwrap();
        assert!(matches!(Totals::of([&half, &half]), Err(ModelError::Validation(_))));
    }

    #[test]
    fn totals_sum_lines() {
        let a = LinePricing::compute(2, d("5.00"), Decimal::ZERO).unwrap();
        let b = LinePricing::compute(1, d("100.00"), d("12.5")).unwrap();
        let t = Totals::of([&a, &b]).unwrap();
        assert_eq!(t.subtotal, d("110.00"));
        assert_eq!(t.tax_total, d("12.50"));
        assert_eq!(t.total, d("122.50"));
    }
}
