use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use gluco_screen_domain::auth::{Session, SessionTokens};
use gluco_screen_domain::entities::Role;

/// Registration request payload
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct PublicRegistrationRequest {
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login request payload
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct PublicLoginRequest {
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct PublicTokenRefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Login and refresh response payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicSessionResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
    pub email: String,
    pub role: Role,
    pub session_id: String,
}

impl From<(Session, SessionTokens)> for PublicSessionResponse {
    fn from((session, tokens): (Session, SessionTokens)) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_in: tokens.expires_in,
            email: session.email,
            role: session.role,
            session_id: session.session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_validation() {
        let ok = PublicRegistrationRequest { email: "ana@example.com".into(), password: "secret1".into() };
        assert!(ok.validate().is_ok());

        let bad = PublicRegistrationRequest { email: "ana".into(), password: "123".into() };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }
}
