use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::token::{self, SecurityError, TokenType};
use crate::auth::Claims;
use crate::entities::user::Role;

/// An authenticated session.
///
/// Created at login and carried by the signed tokens; ended by logout
/// (revocation) or by token expiry. The role is a snapshot taken when the
/// session was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub session_id: String,
    pub email: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Rebuild the session carried by validated access-token claims
    pub fn from_claims(claims: &Claims) -> Result<Self, SecurityError> {
        let at = |secs: i64| Utc.timestamp_opt(secs, 0).single().ok_or(SecurityError::InvalidToken);
        Ok(Self {
            session_id: claims.sid.clone(),
            email: claims.sub.clone(),
            role: Role::from_stored(&claims.role),
            issued_at: at(claims.iat)?,
            expires_at: at(claims.exp)?,
        })
    }
}

/// Tokens handed to the client for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
}

/// Open a new session with its access and refresh tokens
pub fn issue_session(email: &str, role: Role) -> Result<(Session, SessionTokens), SecurityError> {
    let session_id = Uuid::new_v4().to_string();
    let issued_at = Utc::now();

    let (access_token, expires_at) = token::generate_token(email, &session_id, role, TokenType::Access, issued_at)?;
    let (refresh_token, _) = token::generate_token(email, &session_id, role, TokenType::Refresh, issued_at)?;

    let session = Session {
        session_id,
        email: email.to_string(),
        role,
        issued_at,
        expires_at,
    };
    let tokens = SessionTokens {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: (expires_at - issued_at).num_seconds(),
    };
    Ok((session, tokens))
}

/// End a session: both of its tokens stop validating
pub fn end_session(session: &Session) {
    token::revoke_session(&session.session_id, session.issued_at + TokenType::Refresh.expiration());
}
