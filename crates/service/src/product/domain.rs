use models::errors::ModelError;
use models::product;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::refs::RefState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub category_id: Uuid,
    pub company_id: Uuid,
    #[serde(default)]
    pub tax_id: Option<Uuid>,
}

fn default_active() -> bool { true }

/// Partial update. Stock is not editable here; `"tax_id": null` detaches the tax.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProduct {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
    pub category_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    #[serde(default, deserialize_with = "present")]
    pub tax_id: Option<Option<Uuid>>,
}

/// Distinguishes an explicit `null` from an absent key.
fn present<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
    pub category_id: Uuid,
    pub company_id: Uuid,
    pub tax_id: Option<Uuid>,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(ProductFields, i32), ModelError> {
        let fields = ProductFields {
            sku: product::validate_sku(&self.sku)?,
            name: product::validate_name(&self.name)?,
            description: product::validate_description(self.description.as_deref())?,
            price: product::validate_price(self.price)?,
            is_active: self.is_active,
            category_id: self.category_id,
            company_id: self.company_id,
            tax_id: self.tax_id,
        };
        Ok((fields, product::validate_initial_stock(self.stock)?))
    }
}

impl UpdateProduct {
    pub fn merge(&self, current: &product::Model) -> Result<ProductFields, ModelError> {
        Ok(ProductFields {
            sku: product::validate_sku(self.sku.as_deref().unwrap_or(&current.sku))?,
            name: product::validate_name(self.name.as_deref().unwrap_or(&current.name))?,
            description: match &self.description {
                Some(d) => product::validate_description(Some(d))?,
                None => current.description.clone(),
            },
            price: product::validate_price(self.price.unwrap_or(current.price))?,
            is_active: self.is_active.unwrap_or(current.is_active),
            category_id: self.category_id.unwrap_or(current.category_id),
            company_id: self.company_id.unwrap_or(current.company_id),
            tax_id: self.tax_id.unwrap_or(current.tax_id),
        })
    }
}

/// Body of `POST /products/{id}/stock`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub delta: i32,
}

/// Body of the reserve/release endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StockQuantity {
    pub quantity: i32,
}

/// Liveness of the rows a product points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductRefs {
    pub category: RefState,
    pub company: RefState,
    pub tax: Option<RefState>,
}

impl ProductRefs {
    pub fn require_live(&self) -> Result<(), crate::errors::ServiceError> {
        self.category.require("category")?;
        self.company.require("company")?;
        if let Some(tax) = self.tax {
            tax.require("tax")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tax_id_null_differs_from_absent() {
        let u: UpdateProduct = serde_json::from_str(r#"{"tax_id": null}"#).unwrap();
        assert_eq!(u.tax_id, Some(None));
        let u: UpdateProduct = serde_json::from_str(r#"{"name": "Mug"}"#).unwrap();
        assert_eq!(u.tax_id, None);
    }

    #[test]
    fn new_product_defaults() {
        let p: NewProduct = serde_json::from_value(serde_json::json!({
            "sku": "mug-1", "name": "Mug", "price": "9.90",
            "category_id": Uuid::nil(), "company_id": Uuid::nil()
        }))
        .unwrap();
        let (fields, stock) = p.validate().unwrap();
        assert_eq!(fields.sku, "MUG-1");
        assert!(fields.is_active);
        assert_eq!(stock, 0);
    }
}
