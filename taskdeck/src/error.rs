use sea_orm::DbErr;
use thiserror::Error;

use crate::model::FieldError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("{0}")]
    ValidationError(String),

    #[error("Task {0} not found")]
    NotFound(String),

    #[error("Not authorized, please log in again")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("An account with email {0} already exists")]
    DuplicateEmail(String),

    #[error("Password hashing failed: {0}")]
    HashError(String),

    #[error("Token error: {0}")]
    TokenError(#[from] jsonwebtoken::errors::Error),
}

impl ServiceError {
    /// Errors caused by the server itself rather than by the request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ServiceError::DatabaseError(_) | ServiceError::HashError(_) | ServiceError::TokenError(_)
        )
    }
}

impl From<FieldError> for ServiceError {
    fn from(err: FieldError) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}
