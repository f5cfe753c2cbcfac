//! State of a row referenced by another entity's foreign key.

use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefState {
    Missing,
    Deleted,
    Active,
}

impl RefState {
    /// `None` is missing; otherwise decided by the soft-delete flag.
    pub fn of(is_deleted: Option<bool>) -> Self {
        match is_deleted {
            None => RefState::Missing,
            Some(true) => RefState::Deleted,
            Some(false) => RefState::Active,
        }
    }

    /// References must point at live rows.
    pub fn require(self, what: &str) -> Result<(), ServiceError> {
        match self {
            RefState::Active => Ok(()),
            RefState::Missing => Err(ServiceError::Validation(format!("{what} does not exist"))),
            RefState::Deleted => Err(ServiceError::Validation(format!("{what} is deleted"))),
        }
    }
}
