use std::collections::{HashMap, HashSet};

use models::errors::ModelError;
use models::sale::{self, SaleStatus, MAX_ITEMS};
use models::sale_item::{self, LinePricing};
use models::product::{self, Stock};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSaleInput {
    pub company_id: Uuid,
    pub customer_name: String,
    /// CPF or CNPJ, formatted or bare digits.
    pub customer_document: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<SaleLineInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelInput {
    #[serde(default)]
    pub reason: Option<String>,
}

/// A validated sale request, ready for the transactional insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub company_id: Uuid,
    pub customer_name: String,
    pub customer_document: String,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub lines: Vec<(Uuid, i32)>,
}

impl NewSaleInput {
    pub fn validate(&self, created_by: Uuid) -> Result<NewSale, ModelError> {
        if self.items.is_empty() {
            return Err(ModelError::Validation("a sale needs at least one item".into()));
        }
        if self.items.len() > MAX_ITEMS {
            return Err(ModelError::Validation(format!("a sale takes at most {MAX_ITEMS} items")));
        }
        let mut seen = HashSet::new();
        for line in &self.items {
            if line.quantity <= 0 {
                return Err(ModelError::Validation(format!("quantity for {} must be positive", line.product_id)));
            }
            if !seen.insert(line.product_id) {
                return Err(ModelError::Validation(format!("product {} appears twice", line.product_id)));
            }
        }
        Ok(NewSale {
            company_id: self.company_id,
            customer_name: sale::validate_customer_name(&self.customer_name)?,
            customer_document: sale::validate_customer_document(&self.customer_document)?,
            notes: sale::validate_notes(self.notes.as_deref())?,
            created_by,
            lines: self.items.iter().map(|l| (l.product_id, l.quantity)).collect(),
        })
    }
}

/// A product can be sold while it exists, is not deleted and is active.
pub fn ensure_sellable(id: Uuid, product: Option<&product::Model>) -> Result<&product::Model, ServiceError> {
    match product {
        None => Err(ServiceError::Validation(format!("product {id} does not exist"))),
        Some(p) if p.is_deleted => Err(ServiceError::Validation(format!("product {id} is deleted"))),
        Some(p) if !p.is_active => Err(ServiceError::Validation(format!("product {id} is inactive"))),
        Some(p) => Ok(p),
    }
}

/// Price one line from the product's current price and tax rate (0 when untaxed).
pub fn price_line(quantity: i32, product: &product::Model, tax_rate: Option<Decimal>) -> Result<LinePricing, ModelError> {
    LinePricing::compute(quantity, product.price, tax_rate.unwrap_or(Decimal::ZERO))
}

/// One priced line and the product stock after reserving it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedLine {
    pub product_id: Uuid,
    pub pricing: LinePricing,
    pub stock: Stock,
}

/// Price and reserve every line against locked `products`. `rates` maps tax ids to rates.
pub fn plan_lines(
    lines: &[(Uuid, i32)],
    products: &HashMap<Uuid, product::Model>,
    rates: &HashMap<Uuid, Decimal>,
) -> Result<Vec<PlannedLine>, ServiceError> {
    lines
        .iter()
        .map(|&(product_id, quantity)| {
            let p = ensure_sellable(product_id, products.get(&product_id))?;
            let rate = p.tax_id.and_then(|t| rates.get(&t).copied());
            Ok(PlannedLine {
                product_id,
                pricing: price_line(quantity, p, rate)?,
                stock: p.stock_state().reserve(quantity)?,
            })
        })
        .collect()
}

/// New stock per product when a sale enters `next`; empty when the status has no stock effect.
pub fn plan_stock_effects(
    next: SaleStatus,
    items: &[sale_item::Model],
    products: &HashMap<Uuid, product::Model>,
) -> Result<Vec<(Uuid, Stock)>, ServiceError> {
    let mut out = Vec::new();
    for item in items {
        let Some(op) = next.stock_effect(item.quantity) else { continue };
        let p = products
            .get(&item.product_id)
            .ok_or_else(|| ServiceError::InvalidState(format!("product {} of the sale is gone", item.product_id)))?;
        out.push((p.id, p.stock_state().apply(op)?));
    }
    Ok(out)
}

/// A sale with its items, as returned by create and get.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: sale::Model,
    pub items: Vec<sale_item::Model>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(items: Vec<SaleLineInput>) -> NewSaleInput {
        NewSaleInput {
            company_id: Uuid::new_v4(),
            customer_name: "Maria Silva".into(),
            customer_document: "529.982.247-25".into(),
            notes: None,
            items,
        }
    }

    fn line(q: i32) -> SaleLineInput { SaleLineInput { product_id: Uuid::new_v4(), quantity: q } }

    #[test]
    fn item_count_bounds() {
        assert!(input(vec![]).validate(Uuid::nil()).is_err());
        assert!(input((0..MAX_ITEMS).map(|_| line(1)).collect()).validate(Uuid::nil()).is_ok());
        assert!(input((0..=MAX_ITEMS).map(|_| line(1)).collect()).validate(Uuid::nil()).is_err());
    }

    #[test]
    fn duplicates_and_non_positive_quantities_are_rejected() {
        let l = line(1);
        assert!(input(vec![l.clone(), l]).validate(Uuid::nil()).is_err());
        assert!(input(vec![line(0)]).validate(Uuid::nil()).is_err());
    }

    fn product(stock: i32, reserved: i32, tax_id: Option<Uuid>) -> product::Model {
        let now = chrono::Utc::now().into();
        product::Model {
            id: Uuid::new_v4(),
            sku: "SKU".into(),
            name: "Thing".into(),
            description: None,
            price: Decimal::new(1050, 2),
            stock,
            reserved_stock: reserved,
            is_active: true,
            category_id: Uuid::nil(),
            company_id: Uuid::nil(),
            tax_id,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn plan_prices_with_tax_snapshot_and_reserves() {
        let tax = Uuid::new_v4();
        let a = product(5, 1, Some(tax));
        let b = product(3, 0, None);
        let products = HashMap::from([(a.id, a.clone()), (b.id, b.clone())]);
        let rates = HashMap::from([(tax, Decimal::new(10, 0))]);
        let plan = plan_lines(&[(a.id, 2), (b.id, 3)], &products, &rates).unwrap();
        assert_eq!(plan[0].pricing.subtotal, Decimal::new(2100, 2));
        assert_eq!(plan[0].pricing.tax_amount, Decimal::new(210, 2));
        assert_eq!(plan[0].stock, Stock { on_hand: 5, reserved: 3 });
        assert_eq!(plan[1].pricing.tax_rate, Decimal::ZERO);
        assert_eq!(plan[1].stock.available(), 0);
    }

    #[test]
    fn plan_fails_on_missing_inactive_or_short_stock() {
        let mut p = product(2, 0, None);
        let missing = Uuid::new_v4();
        let products = HashMap::from([(p.id, p.clone())]);
        assert!(matches!(plan_lines(&[(missing, 1)], &products, &HashMap::new()), Err(ServiceError::Validation(_))));
        assert!(matches!(plan_lines(&[(p.id, 3)], &products, &HashMap::new()), Err(ServiceError::InvalidState(_))));
        p.is_active = false;
        let products = HashMap::from([(p.id, p.clone())]);
        assert!(matches!(plan_lines(&[(p.id, 1)], &products, &HashMap::new()), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn plan_rejects_lines_too_large_for_the_money_columns() {
        let mut p = product(i32::MAX, 0, None);
        p.price = Decimal::new(50_000_000_000_000, 2);
        let products = HashMap::from([(p.id, p.clone())]);
        assert!(matches!(plan_lines(&[(p.id, 3)], &products, &HashMap::new()), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn stock_effects_follow_the_target_status() {
        let p = product(5, 2, None);
        let item = sale_item::Model {
            id: Uuid::new_v4(),
            sale_id: Uuid::new_v4(),
            product_id: p.id,
            quantity: 2,
            unit_price: p.price,
            tax_rate: Decimal::ZERO,
            subtotal: Decimal::new(2100, 2),
            tax_amount: Decimal::ZERO,
            total: Decimal::new(2100, 2),
        };
        let products = HashMap::from([(p.id, p.clone())]);
        let items = [item];
        assert!(plan_stock_effects(SaleStatus::Confirmed, &items, &products).unwrap().is_empty());
        assert_eq!(
            plan_stock_effects(SaleStatus::Completed, &items, &products).unwrap(),
            vec![(p.id, Stock { on_hand: 3, reserved: 0 })]
        );
        assert_eq!(
            plan_stock_effects(SaleStatus::Cancelled, &items, &products).unwrap(),
            vec![(p.id, Stock { on_hand: 5, reserved: 0 })]
        );
    }

    #[test]
    fn customer_document_is_reduced_to_digits() {
        let s = input(vec![line(2)]).validate(Uuid::nil()).unwrap();
        assert_eq!(s.customer_document, "52998224725");
        assert_eq!(s.lines[0].1, 2);
    }
}
