use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::errors::ModelError;
use crate::validate;

pub const MAX_ITEMS: usize = 100;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sale")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub customer_name: String,
    /// CPF or CNPJ digits.
    pub customer_document: String,
    pub status: SaleStatus,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub tax_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub total: Decimal,
    pub notes: Option<String>,
    pub cancel_reason: Option<String>,
    pub created_by: Uuid,
    pub confirmed_at: Option<DateTimeWithTimeZone>,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub cancelled_at: Option<DateTimeWithTimeZone>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::company::Entity",
        from = "Column::CompanyId",
        to = "crate::company::Column::Id"
    )]
    Company,
    #[sea_orm(has_many = "crate::sale_item::Entity")]
    SaleItem,
}

impl Related<crate::company::Entity> for Entity {
    fn to() -> RelationDef { Relation::Company.def() }
}

impl Related<crate::sale_item::Entity> for Entity {
    fn to() -> RelationDef { Relation::SaleItem.def() }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Confirmed => "confirmed",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SaleStatus::Completed | SaleStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: SaleStatus) -> bool {
        use SaleStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }

    pub fn transition(self, next: SaleStatus) -> Result<SaleStatus, ModelError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ModelError::InvalidState(format!("sale cannot move from {self} to {next}")))
        }
    }

    /// Stock effect of entering `self`: cancelled releases reservations, completed commits them.
    pub fn stock_effect(&self, quantity: i32) -> Option<crate::product::StockOp> {
        match self {
            SaleStatus::Cancelled => Some(crate::product::StockOp::Release(quantity)),
            SaleStatus::Completed => Some(crate::product::StockOp::Commit(quantity)),
            SaleStatus::Pending | SaleStatus::Confirmed => None,
        }
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for SaleStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(SaleStatus::Pending),
            "confirmed" => Ok(SaleStatus::Confirmed),
            "completed" => Ok(SaleStatus::Completed),
            "cancelled" => Ok(SaleStatus::Cancelled),
            other => Err(ModelError::Validation(format!("unknown sale status: {other}"))),
        }
    }
}

pub fn validate_customer_name(name: &str) -> Result<String, ModelError> {
    validate::text("customer_name", name, 2, 150)
}

pub fn validate_customer_document(document: &str) -> Result<String, ModelError> {
    Ok(Document::parse(document)?.into_digits())
}

pub fn validate_notes(notes: Option<&str>) -> Result<Option<String>, ModelError> {
    validate::optional_text("notes", notes, 1000)
}

pub fn validate_cancel_reason(reason: Option<&str>) -> Result<Option<String>, ModelError> {
    validate::optional_text("cancel_reason", reason, 500)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::StockOp;

    #[test]
    fn allowed_transitions() {
        use SaleStatus::*;
        assert_eq!(Pending.transition(Confirmed).unwrap(), Confirmed);
        assert_eq!(Pending.transition(Cancelled).unwrap(), Cancelled);
        assert_eq!(Confirmed.transition(Completed).unwrap(), Completed);
        assert_eq!(Confirmed.transition(Cancelled).unwrap(), Cancelled);
    }

    #[test]
    fn forbidden_transitions() {
        use SaleStatus::*;
        assert!(matches!(Pending.transition(Completed), Err(ModelError::InvalidState(_))));
        assert!(Completed.transition(Cancelled).is_err());
        assert!(Cancelled.transition(Confirmed).is_err());
        assert!(Confirmed.transition(Confirmed).is_err());
        assert!(Completed.is_terminal() && Cancelled.is_terminal() && !Pending.is_terminal());
    }

    #[test]
    fn stock_effects_follow_target_status() {
        assert_eq!(SaleStatus::Cancelled.stock_effect(2), Some(StockOp::Release(2)));
        assert_eq!(SaleStatus::Completed.stock_effect(2), Some(StockOp::Commit(2)));
        assert!(SaleStatus::Confirmed.stock_effect(2).is_none());
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Confirmed".parse::<SaleStatus>().unwrap(), SaleStatus::Confirmed);
        assert!("shipped".parse::<SaleStatus>().is_err());
    }

    #[test]
    fn customer_document_accepts_cpf_or_cnpj() {
        assert_eq!(validate_customer_document("529.982.247-25").unwrap(), "52998224725");
        assert_eq!(validate_customer_document("11.222.333/0001-81").unwrap(), "11222333000181");
        assert!(validate_customer_document("123").is_err());
    }
}
