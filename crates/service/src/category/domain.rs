use models::category;
use models::errors::ModelError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update; a blank `description` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Validated column values.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryFields {
    pub name: String,
    pub description: Option<String>,
}

impl NewCategory {
    pub fn validate(&self) -> Result<CategoryFields, ModelError> {
        Ok(CategoryFields {
            name: category::validate_name(&self.name)?,
            description: category::validate_description(self.description.as_deref())?,
        })
    }
}

impl UpdateCategory {
    pub fn merge(&self, current: &category::Model) -> Result<CategoryFields, ModelError> {
        Ok(CategoryFields {
            name: category::validate_name(self.name.as_deref().unwrap_or(&current.name))?,
            description: match &self.description {
                Some(d) => category::validate_description(Some(d))?,
                None => current.description.clone(),
            },
        })
    }
}
