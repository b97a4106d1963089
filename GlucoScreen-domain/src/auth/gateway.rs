//! Narrow interface to the identity provider

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// An identity confirmed by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayIdentity {
    pub uid: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account already exists for {0}")]
    DuplicateIdentity(String),

    #[error("No account for {0}")]
    UserNotFound(String),

    #[error("Password rejected: {0}")]
    WeakPassword(String),

    /// The provider could not be reached
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),

    /// Any other provider-side failure
    #[error("Identity provider error: {0}")]
    Provider(String),
}

/// Operations the application needs from an identity provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<GatewayIdentity, GatewayError>;

    /// Create an identity and return its uid
    async fn create_user(&self, email: &str, password: &str) -> Result<String, GatewayError>;

    async fn find_uid(&self, email: &str) -> Result<Option<String>, GatewayError>;

    async fn delete_user(&self, uid: &str) -> Result<(), GatewayError>;

    async fn update_password(&self, uid: &str, new_password: &str) -> Result<(), GatewayError>;
}

#[async_trait]
impl<T: AuthGateway + ?Sized> AuthGateway for Arc<T> {
    async fn sign_in(&self, email: &str, password: &str) -> Result<GatewayIdentity, GatewayError> {
        (**self).sign_in(email, password).await
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<String, GatewayError> {
        (**self).create_user(email, password).await
    }

    async fn find_uid(&self, email: &str) -> Result<Option<String>, GatewayError> {
        (**self).find_uid(email).await
    }

    async fn delete_user(&self, uid: &str) -> Result<(), GatewayError> {
        (**self).delete_user(uid).await
    }

    async fn update_password(&self, uid: &str, new_password: &str) -> Result<(), GatewayError> {
        (**self).update_password(uid, new_password).await
    }
}
