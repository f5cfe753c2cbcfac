//! OData-subset list queries: parsing, SQL translation, result shaping and caching.

pub mod ast;
pub mod cache;
pub mod query;
pub mod shape;
pub mod translate;

use thiserror::Error;

pub use cache::QueryCache;
pub use query::{ODataQuery, OrderKey, SortDir};
pub use translate::{FieldKind, FieldMap};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ODataError {
    #[error("invalid query option: {0}")]
    InvalidOption(String),
    #[error("invalid $filter: {0}")]
    InvalidFilter(String),
    #[error("invalid $orderby: {0}")]
    InvalidOrderBy(String),
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("unknown navigation property: {0}")]
    UnknownNavigation(String),
    #[error("type mismatch on {field}: expected {expected:?}, got {got}")]
    TypeMismatch { field: String, expected: FieldKind, got: &'static str },
    #[error("unsupported function or arguments: {0}()")]
    UnsupportedFn(String),
    #[error("unsupported expression: {0}")]
    Unsupported(String),
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
}

/// Entities exposed through list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntitySet {
    Categories,
    Companies,
    Taxes,
    Products,
    Sales,
}

impl EntitySet {
    pub const ALL: [EntitySet; 5] = [
        EntitySet::Categories,
        EntitySet::Companies,
        EntitySet::Taxes,
        EntitySet::Products,
        EntitySet::Sales,
    ];

    /// Name used under `/odata/`.
    pub fn name(&self) -> &'static str {
        match self {
            EntitySet::Categories => "Categories",
            EntitySet::Companies => "Companies",
            EntitySet::Taxes => "Taxes",
            EntitySet::Products => "Products",
            EntitySet::Sales => "Sales",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name().eq_ignore_ascii_case(name))
    }

    pub fn navigations(&self) -> &'static [&'static str] {
        match self {
            EntitySet::Products => &["category", "company", "tax"],
            EntitySet::Sales => &["company", "items"],
            EntitySet::Categories | EntitySet::Companies | EntitySet::Taxes => &[],
        }
    }

    /// Entity sets whose cached lists go stale when `self` is written:
    /// itself, sets that embed it via `$expand`, and sets whose rows it mutates.
    pub fn invalidates(&self) -> &'static [EntitySet] {
        match self {
            EntitySet::Categories => &[EntitySet::Categories, EntitySet::Products],
            EntitySet::Companies => &[EntitySet::Companies, EntitySet::Products, EntitySet::Sales],
            EntitySet::Taxes => &[EntitySet::Taxes, EntitySet::Products],
            EntitySet::Products => &[EntitySet::Products],
            EntitySet::Sales => &[EntitySet::Sales, EntitySet::Products],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_set_names_are_case_insensitive() {
        assert_eq!(EntitySet::from_name("products"), Some(EntitySet::Products));
        assert_eq!(EntitySet::from_name("Sales"), Some(EntitySet::Sales));
        assert_eq!(EntitySet::from_name("Users"), None);
    }

    #[test]
    fn writes_invalidate_themselves() {
        for set in EntitySet::ALL {
            assert!(set.invalidates().contains(&set));
        }
    }
}
