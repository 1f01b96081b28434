use thiserror::Error;

use crate::auth::{PasswordError, SessionError};
use crate::database::StoreError;

/// Failures surfaced by the helpdesk services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or malformed input, naming the offending field
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    /// Unknown email or wrong password; deliberately indistinguishable
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Store(StoreError),
}

impl ServiceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn required(field: &'static str) -> Self {
        Self::validation(field, format!("{} is required", field))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingReference("ticket") => ServiceError::not_found("Ticket not found"),
            StoreError::MissingReference(_) => ServiceError::not_found("User not found"),
            other => ServiceError::Store(other),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<SessionError> for ServiceError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Expired => ServiceError::Unauthorized("Session expired".to_string()),
            SessionError::Invalid(_) => ServiceError::Unauthorized("Invalid session token".to_string()),
            SessionError::Signing(msg) => ServiceError::Internal(msg),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
