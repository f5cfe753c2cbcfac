use models::company::{self, CompanyFields};
use models::errors::ModelError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCompany {
    pub name: String,
    #[serde(default)]
    pub trade_name: Option<String>,
    /// CNPJ, formatted or bare digits.
    pub document: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Partial update; blank optional fields are cleared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCompany {
    pub name: Option<String>,
    pub trade_name: Option<String>,
    pub document: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl NewCompany {
    pub fn validate(&self) -> Result<CompanyFields, ModelError> {
        company::validate_fields(
            &self.name,
            self.trade_name.as_deref(),
            &self.document,
            self.email.as_deref(),
            self.phone.as_deref(),
        )
    }
}

impl UpdateCompany {
    pub fn merge(&self, current: &company::Model) -> Result<CompanyFields, ModelError> {
        let pick = |new: &Option<String>, old: &Option<String>| new.clone().or_else(|| old.clone());
        let trade_name = pick(&self.trade_name, &current.trade_name);
        let email = pick(&self.email, &current.email);
        let phone = pick(&self.phone, &current.phone);
        company::validate_fields(
            self.name.as_deref().unwrap_or(&current.name),
            trade_name.as_deref(),
            self.document.as_deref().unwrap_or(&current.document),
            email.as_deref(),
            phone.as_deref(),
        )
    }
}
