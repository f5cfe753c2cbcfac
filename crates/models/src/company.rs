use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::document;
use crate::errors::ModelError;
use crate::validate;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "company")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub trade_name: Option<String>,
    /// CNPJ, 14 digits without formatting.
    pub document: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::product::Entity")]
    Product,
    #[sea_orm(has_many = "crate::sale::Entity")]
    Sale,
}

impl Related<crate::product::Entity> for Entity {
    fn to() -> RelationDef { Relation::Product.def() }
}

impl Related<crate::sale::Entity> for Entity {
    fn to() -> RelationDef { Relation::Sale.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Validated company fields, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyFields {
    pub name: String,
    pub trade_name: Option<String>,
    pub document: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub fn validate_fields(
    name: &str,
    trade_name: Option<&str>,
    document: &str,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<CompanyFields, ModelError> {
    Ok(CompanyFields {
        name: validate::text("name", name, 2, 150)?,
        trade_name: validate::optional_text("trade_name", trade_name, 150)?,
        document: document::parse_cnpj(document)?,
        email: validate::optional_email(email)?,
        phone: validate::optional_phone(phone)?,
    })
}
