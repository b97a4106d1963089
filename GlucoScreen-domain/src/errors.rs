//! Error kinds surfaced by the domain services.
//!
//! Each kind tells the caller whether the problem is the user's input, the
//! caller's identity or privileges, or the infrastructure behind the service.

use thiserror::Error;
use gluco_screen_data::repository::RepositoryError;

use crate::auth::gateway::GatewayError;
use crate::auth::token::SecurityError;
use crate::classifier::ClassifierError;

/// Distinguished error kinds for every domain operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScreeningError {
    /// Invalid or incomplete input; nothing was persisted
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The classifier artifact is missing, corrupt or inconsistent
    #[error("Model unavailable: {0}")]
    ModelUnavailableError(String),

    /// Bad credentials, duplicate registration or an invalid session token
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// The backing store or identity provider could not be reached
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    /// The session lacks the privilege for this operation
    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    /// The targeted identity does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ScreeningError {
    /// Stable machine-readable code used in error responses
    pub fn code(&self) -> &'static str {
        match self {
            ScreeningError::ValidationError(_) => "validation_error",
            ScreeningError::ModelUnavailableError(_) => "model_unavailable",
            ScreeningError::AuthError(_) => "auth_error",
            ScreeningError::PersistenceError(_) => "persistence_error",
            ScreeningError::AuthorizationError(_) => "forbidden",
            ScreeningError::NotFound(_) => "not_found",
        }
    }

    /// The human-readable message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            ScreeningError::ValidationError(m)
            | ScreeningError::ModelUnavailableError(m)
            | ScreeningError::AuthError(m)
            | ScreeningError::PersistenceError(m)
            | ScreeningError::AuthorizationError(m)
            | ScreeningError::NotFound(m) => m,
        }
    }
}

impl From<RepositoryError> for ScreeningError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Validation(msg) => ScreeningError::ValidationError(msg),
            RepositoryError::NotFound(msg) => ScreeningError::NotFound(msg),
            other => ScreeningError::PersistenceError(other.to_string()),
        }
    }
}

impl From<ClassifierError> for ScreeningError {
    fn from(err: ClassifierError) -> Self {
        ScreeningError::ModelUnavailableError(err.to_string())
    }
}

impl From<GatewayError> for ScreeningError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::InvalidCredentials
            | GatewayError::DuplicateIdentity(_)
            | GatewayError::WeakPassword(_) => ScreeningError::AuthError(err.to_string()),
            GatewayError::UserNotFound(_) => ScreeningError::NotFound(err.to_string()),
            GatewayError::Unavailable(_) | GatewayError::Provider(_) => {
                ScreeningError::PersistenceError(err.to_string())
            }
        }
    }
}

impl From<SecurityError> for ScreeningError {
    fn from(err: SecurityError) -> Self {
        match err {
            SecurityError::ConfigError(msg) => ScreeningError::PersistenceError(msg),
            other => ScreeningError::AuthError(other.to_string()),
        }
    }
}
