use thiserror::Error;

use crate::odata::ODataError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("invalid query: {0}")]
    Query(#[from] ODataError),
    #[error("database error: {0}")]
    Db(String),
    #[error("model error: {0}")]
    Model(models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }
}

/// Validation and state violations keep their meaning across the layer boundary.
impl From<models::errors::ModelError> for ServiceError {
    fn from(e: models::errors::ModelError) -> Self {
        use models::errors::ModelError;
        match e {
            ModelError::Validation(m) => ServiceError::Validation(m),
            ModelError::InvalidState(m) => ServiceError::InvalidState(m),
            other @ ModelError::Db(_) => ServiceError::Model(other),
        }
    }
}

/// Constraint violations that slip past the pre-checks (concurrent writers) surface as conflicts.
impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self {
        match e.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(m)) => ServiceError::Conflict(m),
            Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(m)) => ServiceError::Conflict(m),
            _ => ServiceError::Db(e.to_string()),
        }
    }
}
