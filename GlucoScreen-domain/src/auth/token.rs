use std::env;
use std::time::{Duration as StdDuration, SystemTime};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::auth::token_blacklist;
use crate::auth::Claims;
use crate::entities::user::Role;

/// Default issuer when `JWT_ISSUER` is not set
pub const DEFAULT_ISSUER: &str = "gluco-screen-api";

/// Security errors for token operations
#[derive(Debug, Error)]
pub enum SecurityError {
    /// JWT validation error
    #[error("Token validation error: {0}")]
    TokenValidation(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token is not yet valid")]
    TokenNotYetValid,

    /// Invalid token structure
    #[error("Invalid token format")]
    InvalidToken,

    #[error("Invalid token issuer")]
    InvalidIssuer,

    /// An access token used as refresh token or the other way round
    #[error("Expected a {expected} token, got {actual}")]
    WrongTokenType { expected: &'static str, actual: String },

    /// Configuration error
    #[error("Security configuration error: {0}")]
    ConfigError(String),

    /// The session behind the token was ended
    #[error("Token has been revoked")]
    TokenRevoked,
}

/// Token types for authentication
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenType {
    /// Short-lived access token
    Access,
    /// Long-lived refresh token
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }

    /// Lifetime of this token type
    pub fn expiration(&self) -> Duration {
        match self {
            TokenType::Access => {
                let minutes = env::var("ACCESS_TOKEN_EXPIRATION_MINUTES")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(15);
                Duration::minutes(minutes)
            }
            TokenType::Refresh => {
                let days = env::var("REFRESH_TOKEN_EXPIRATION_DAYS")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(7);
                Duration::days(days)
            }
        }
    }
}

fn jwt_secret() -> Result<String, SecurityError> {
    env::var("JWT_SECRET").map_err(|e| {
        error!("JWT_SECRET environment variable not found: {}", e);
        SecurityError::ConfigError("JWT_SECRET environment variable not found".to_string())
    })
}

fn issuer() -> String {
    env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string())
}

/// Sign a token for one session
pub fn generate_token(
    email: &str,
    session_id: &str,
    role: Role,
    token_type: TokenType,
    issued_at: DateTime<Utc>,
) -> Result<(String, DateTime<Utc>), SecurityError> {
    let secret = jwt_secret()?;
    let expires_at = issued_at + token_type.expiration();

    let claims = Claims {
        sub: email.to_string(),
        iss: issuer(),
        iat: issued_at.timestamp(),
        exp: expires_at.timestamp(),
        sid: session_id.to_string(),
        role: role.as_str().to_string(),
        typ: token_type.as_str().to_string(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!("Failed to encode JWT token: {}", e);
        SecurityError::TokenValidation(e.to_string())
    })?;

    debug!("Generated {} token for {} (session {}), expires {}", token_type.as_str(), email, session_id, expires_at);
    Ok((token, expires_at))
}

/// Validate signature, issuer, expiry, token type and revocation
pub fn validate_token(token: &str, expected: TokenType) -> Result<Claims, SecurityError> {
    let secret = jwt_secret()?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.set_issuer(&[issuer()]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => SecurityError::TokenExpired,
        jsonwebtoken::errors::ErrorKind::ImmatureSignature => SecurityError::TokenNotYetValid,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => SecurityError::InvalidIssuer,
        jsonwebtoken::errors::ErrorKind::InvalidToken => SecurityError::InvalidToken,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => {
            SecurityError::TokenValidation("Invalid signature".to_string())
        }
        _ => SecurityError::TokenValidation(e.to_string()),
    })?;

    let claims = token_data.claims;
    if claims.typ != expected.as_str() {
        return Err(SecurityError::WrongTokenType {
            expected: expected.as_str(),
            actual: claims.typ,
        });
    }

    if is_session_revoked(&claims.sid) {
        return Err(SecurityError::TokenRevoked);
    }

    Ok(claims)
}

fn is_session_revoked(session_id: &str) -> bool {
    let revoked = token_blacklist::blacklist().is_revoked(session_id);
    debug!("Checking if session {} is revoked: {}", session_id, revoked);
    revoked
}

/// Revoke every token of a session until `until`
pub fn revoke_session(session_id: &str, until: DateTime<Utc>) {
    info!("Revoking session {}", session_id);
    let remaining = (until - Utc::now()).to_std().unwrap_or(StdDuration::ZERO);
    token_blacklist::blacklist().revoke_token(session_id, SystemTime::now() + remaining);
}
