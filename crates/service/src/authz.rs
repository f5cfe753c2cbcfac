//! Role-based access policy.
//!
//! Routes are classified into a `(Resource, Action)` pair by the HTTP layer; this module
//! only answers whether a role may perform it.

use models::user::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Categories,
    Companies,
    Taxes,
    Products,
    Sales,
    Users,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Restore,
    AdjustStock,
    /// Reserve or release product stock.
    Reserve,
    Confirm,
    Complete,
    Cancel,
    ChangeRole,
}

impl Resource {
    pub fn is_catalog_or_sales(&self) -> bool { !matches!(self, Resource::Users) }
}

pub fn is_allowed(role: Role, resource: Resource, action: Action) -> bool {
    match role {
        Role::Admin => true,
        Role::Manager => {
            resource.is_catalog_or_sales() && !matches!(action, Action::Delete | Action::Restore | Action::ChangeRole)
        }
        Role::Seller => match (resource, action) {
            (Resource::Users, _) => false,
            (_, Action::Read) => true,
            (Resource::Sales, Action::Create | Action::Confirm | Action::Cancel) => true,
            (Resource::Products, Action::Reserve) => true,
            _ => false,
        },
        Role::Viewer => resource.is_catalog_or_sales() && action == Action::Read,
    }
}
