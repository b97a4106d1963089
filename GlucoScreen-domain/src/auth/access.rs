//! Login, registration and session lifecycle

use async_trait::async_trait;
use tracing::{debug, info, warn};

use gluco_screen_data::models::{ProfileChanges, StoredUserProfile};
use gluco_screen_data::repository::{storage_timestamp, ProfileStore, RepositoryError};

use super::gateway::{AuthGateway, GatewayError};
use super::local::MIN_PASSWORD_LENGTH;
use super::logging::{
    log_auth_event, log_failed_login, log_logout, log_successful_login, log_token_refresh, AuthEvent,
    AuthEventType,
};
use super::session::{end_session, issue_session, Session, SessionTokens};
use super::token::{self, TokenType};
use crate::entities::conversions;
use crate::entities::user::{Role, UserProfile};
use crate::errors::ScreeningError;

#[async_trait]
pub trait AccessControlTrait: Send + Sync {
    /// Verify credentials and open a session. The role is read from the
    /// profile store at this moment.
    async fn login(&self, email: &str, password: &str) -> Result<(Session, SessionTokens), ScreeningError>;

    /// Create an identity and its default profile
    async fn register(&self, email: &str, password: &str) -> Result<UserProfile, ScreeningError>;

    /// Role snapshot of a session
    fn current_role(&self, session: &Session) -> Role;

    /// End a session. Always succeeds, also for sessions already ended.
    fn logout(&self, session: &Session);

    /// Exchange a refresh token for a new session, re-reading the role
    async fn refresh(&self, refresh_token: &str) -> Result<(Session, SessionTokens), ScreeningError>;

    /// Resolve an access token to its session
    fn authenticate(&self, access_token: &str) -> Result<Session, ScreeningError>;
}

pub struct AccessControlService<G: AuthGateway, P: ProfileStore> {
    gateway: G,
    profiles: P,
}

impl<G: AuthGateway, P: ProfileStore> AccessControlService<G, P> {
    pub fn new(gateway: G, profiles: P) -> Self {
        Self { gateway, profiles }
    }

    async fn stored_role(&self, email: &str) -> Result<Role, ScreeningError> {
        let profile = self.profiles.get(email).await?;
        Ok(profile.map(|p| Role::from_stored(&p.role)).unwrap_or_default())
    }

    /// Make sure an admin identity exists with the admin role, creating it if needed
    pub async fn ensure_admin_account(&self, email: &str, password: &str) -> Result<(), ScreeningError> {
        let email = normalize_email(email);
        match self.gateway.create_user(&email, password).await {
            Ok(_) => info!("Created admin account {}", email),
            Err(GatewayError::DuplicateIdentity(_)) => debug!("Admin account {} already exists", email),
            Err(e) => return Err(e.into()),
        }

        let changes = ProfileChanges {
            role: Some(Role::Admin.as_str().to_string()),
            updated_at: Some(storage_timestamp()),
            ..Default::default()
        };
        self.profiles.merge(&email, changes).await?;
        Ok(())
    }
}

/// Canonical form of an email, used as the identity and profile key
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_credentials(email: &str, password: &str) -> Result<(), ScreeningError> {
    if !validator::validate_email(email) {
        return Err(ScreeningError::ValidationError(format!("'{}' is not a valid email address", email)));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ScreeningError::ValidationError(format!(
            "Password must be at least {} characters", MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

#[async_trait]
impl<G: AuthGateway, P: ProfileStore> AccessControlTrait for AccessControlService<G, P> {
    async fn login(&self, email: &str, password: &str) -> Result<(Session, SessionTokens), ScreeningError> {
        let email = normalize_email(email);

        let identity = match self.gateway.sign_in(&email, password).await {
            Ok(identity) => identity,
            Err(e) => {
                log_failed_login(&email, &e.to_string());
                return Err(e.into());
            }
        };

        let role = self.stored_role(&identity.email).await?;
        let (session, tokens) = issue_session(&identity.email, role)?;

        log_successful_login(&identity.email);
        Ok((session, tokens))
    }

    async fn register(&self, email: &str, password: &str) -> Result<UserProfile, ScreeningError> {
        let email = normalize_email(email);
        validate_credentials(&email, password)?;

        match self.gateway.create_user(&email, password).await {
            Ok(uid) => debug!("Identity {} created for {}", uid, email),
            Err(GatewayError::WeakPassword(msg)) => return Err(ScreeningError::ValidationError(msg)),
            Err(e) => {
                log_auth_event(
                    AuthEvent::new(AuthEventType::Registration, Some(&email), false).with_details(e.to_string()),
                );
                return Err(e.into());
            }
        }

        let mut profile = StoredUserProfile::new(email.clone());
        profile.name = Some(String::new());
        profile.created_at = Some(storage_timestamp());

        let stored = match self.profiles.create(profile).await {
            Ok(stored) => stored,
            // A profile set up by an admin before the identity existed is kept
            Err(RepositoryError::Validation(_)) => self
                .profiles
                .get(&email)
                .await?
                .ok_or_else(|| ScreeningError::PersistenceError(format!("Profile of {} vanished", email)))?,
            Err(e) => return Err(e.into()),
        };

        log_auth_event(AuthEvent::new(AuthEventType::Registration, Some(&email), true));
        Ok(conversions::convert_to_domain_profile(stored))
    }

    fn current_role(&self, session: &Session) -> Role {
        session.role
    }

    fn logout(&self, session: &Session) {
        end_session(session);
        log_logout(&session.email);
    }

    async fn refresh(&self, refresh_token: &str) -> Result<(Session, SessionTokens), ScreeningError> {
        let claims = match token::validate_token(refresh_token, TokenType::Refresh) {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Refresh rejected: {}", e);
                log_token_refresh("unknown", false, Some(&e.to_string()));
                return Err(e.into());
            }
        };

        let role = self.stored_role(&claims.sub).await?;
        let previous = Session::from_claims(&claims)?;
        let (session, tokens) = issue_session(&claims.sub, role)?;

        // One refresh token opens exactly one new session
        end_session(&previous);

        let detail = format!("role {}", role);
        log_token_refresh(&claims.sub, true, Some(&detail));
        Ok((session, tokens))
    }

    fn authenticate(&self, access_token: &str) -> Result<Session, ScreeningError> {
        let claims = token::validate_token(access_token, TokenType::Access)?;
        Ok(Session::from_claims(&claims)?)
    }
}
