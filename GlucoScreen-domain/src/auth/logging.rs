use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Kinds of audited authentication events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEventType {
    Login,
    FailedLogin,
    Logout,
    Registration,
    TokenRefresh,
    TokenValidation,
    AccessDenied,
    RoleChange,
    PasswordReset,
    AccountDeletion,
}

impl std::fmt::Display for AuthEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuthEventType::Login => "LOGIN",
            AuthEventType::FailedLogin => "FAILED_LOGIN",
            AuthEventType::Logout => "LOGOUT",
            AuthEventType::Registration => "REGISTRATION",
            AuthEventType::TokenRefresh => "TOKEN_REFRESH",
            AuthEventType::TokenValidation => "TOKEN_VALIDATION",
            AuthEventType::AccessDenied => "ACCESS_DENIED",
            AuthEventType::RoleChange => "ROLE_CHANGE",
            AuthEventType::PasswordReset => "PASSWORD_RESET",
            AuthEventType::AccountDeletion => "ACCOUNT_DELETION",
        };
        f.write_str(s)
    }
}

/// One audited event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEvent {
    pub event_type: AuthEventType,
    /// Email of the acting identity, if known
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub details: Option<String>,
    /// Request path or target identity
    pub resource: Option<String>,
    pub duration_ms: Option<u64>,
    /// password, jwt, rbac ...
    pub auth_method: Option<String>,
}

impl AuthEvent {
    pub fn new(event_type: AuthEventType, user_id: Option<&str>, success: bool) -> Self {
        Self {
            event_type,
            user_id: user_id.map(String::from),
            timestamp: Utc::now(),
            success,
            details: None,
            resource: None,
            duration_ms: None,
            auth_method: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_auth_method(mut self, auth_method: impl Into<String>) -> Self {
        self.auth_method = Some(auth_method.into());
        self
    }

    /// The audit line written for this event
    pub fn line(&self) -> String {
        format!(
            "AUTH-LOG [{}] [{}] [{}] [{}] {}",
            self.event_type,
            self.user_id.as_deref().unwrap_or("anonymous"),
            if self.success { "SUCCESS" } else { "FAILURE" },
            self.timestamp.to_rfc3339(),
            self.details.as_deref().unwrap_or("")
        )
    }
}

/// Write an authentication event to the log
pub fn log_auth_event(event: AuthEvent) {
    info!("{}", event.line());
}

pub fn log_successful_login(email: &str) {
    log_auth_event(AuthEvent::new(AuthEventType::Login, Some(email), true).with_auth_method("password"));
}

pub fn log_failed_login(email: &str, reason: &str) {
    log_auth_event(
        AuthEvent::new(AuthEventType::FailedLogin, Some(email), false)
            .with_details(reason)
            .with_auth_method("password"),
    );
}

pub fn log_token_refresh(email: &str, success: bool, details: Option<&str>) {
    let mut event = AuthEvent::new(AuthEventType::TokenRefresh, Some(email), success);
    if let Some(d) = details {
        event = event.with_details(d);
    }
    log_auth_event(event);
}

pub fn log_logout(email: &str) {
    log_auth_event(AuthEvent::new(AuthEventType::Logout, Some(email), true));
}

pub fn log_access_denied(email: &str, resource: &str, required_roles: &[String]) {
    log_auth_event(
        AuthEvent::new(AuthEventType::AccessDenied, Some(email), false)
            .with_resource(resource)
            .with_details(format!("Required roles: {}", required_roles.join(", ")))
            .with_auth_method("rbac"),
    );
}

/// An admin action on another account
pub fn log_admin_action(event_type: AuthEventType, actor: &str, target: &str, success: bool) {
    log_auth_event(
        AuthEvent::new(event_type, Some(actor), success)
            .with_resource(target)
            .with_details(format!("target: {}", target)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_auth_event() {
        let event = AuthEvent::new(AuthEventType::Login, Some("ana@example.com"), true)
            .with_details("Login from web")
            .with_resource("/auth/login")
            .with_duration(12)
            .with_auth_method("password");

        assert_eq!(event.event_type, AuthEventType::Login);
        assert_eq!(event.user_id.as_deref(), Some("ana@example.com"));
        assert!(event.success);
        assert_eq!(event.resource.as_deref(), Some("/auth/login"));
        assert_eq!(event.duration_ms, Some(12));
    }

    #[test]
    fn test_audit_line_format() {
        let event = AuthEvent::new(AuthEventType::FailedLogin, None, false).with_details("bad password");
        let line = event.line();
        assert!(line.starts_with("AUTH-LOG [FAILED_LOGIN] [anonymous] [FAILURE] ["));
        assert!(line.ends_with("bad password"));
    }
}
