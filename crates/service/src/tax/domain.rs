use models::errors::ModelError;
use models::tax;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTax {
    pub code: String,
    pub name: String,
    pub rate: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTax {
    pub code: Option<String>,
    pub name: Option<String>,
    pub rate: Option<Decimal>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxFields {
    pub code: String,
    pub name: String,
    pub rate: Decimal,
    pub description: Option<String>,
}

impl NewTax {
    pub fn validate(&self) -> Result<TaxFields, ModelError> {
        Ok(TaxFields {
            code: tax::validate_code(&self.code)?,
            name: tax::validate_name(&self.name)?,
            rate: tax::validate_rate(self.rate)?,
            description: tax::validate_description(self.description.as_deref())?,
        })
    }
}

impl UpdateTax {
    pub fn merge(&self, current: &tax::Model) -> Result<TaxFields, ModelError> {
        Ok(TaxFields {
            code: tax::validate_code(self.code.as_deref().unwrap_or(&current.code))?,
            name: tax::validate_name(self.name.as_deref().unwrap_or(&current.name))?,
            rate: tax::validate_rate(self.rate.unwrap_or(current.rate))?,
            description: match &self.description {
                Some(d) => tax::validate_description(Some(d))?,
                None => current.description.clone(),
            },
        })
    }
}
