//! Identity Toolkit REST client
//!
//! Sign-up and sign-in use the web API key. Lookup, update and delete are
//! admin operations and need an OAuth bearer token.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use super::gateway::{AuthGateway, GatewayError, GatewayIdentity};
use crate::config::FirebaseSettings;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map a provider error message such as `WEAK_PASSWORD : Password should be
/// at least 6 characters` onto a gateway error
pub fn map_error_code(message: &str, subject: &str) -> GatewayError {
    let code = message.split([' ', ':']).next().unwrap_or(message);
    match code {
        "EMAIL_EXISTS" => GatewayError::DuplicateIdentity(subject.to_string()),
        "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL" => {
            GatewayError::InvalidCredentials
        }
        "USER_NOT_FOUND" => GatewayError::UserNotFound(subject.to_string()),
        "WEAK_PASSWORD" => GatewayError::WeakPassword(
            message
                .split_once(':')
                .map(|(_, detail)| detail.trim().to_string())
                .unwrap_or_else(|| message.to_string()),
        ),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => GatewayError::Unavailable(message.to_string()),
        _ => GatewayError::Provider(message.to_string()),
    }
}

pub struct FirebaseAuthGateway {
    client: Client,
    settings: FirebaseSettings,
}

impl FirebaseAuthGateway {
    pub fn new(settings: FirebaseSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    /// URL of a public endpoint, authenticated with the API key
    fn public_url(&self, method: &str) -> String {
        format!("{}/accounts:{}?key={}", self.settings.base_url.trim_end_matches('/'), method, self.settings.api_key)
    }

    /// URL of an admin endpoint, scoped to the project when one is configured
    fn admin_url(&self, method: &str) -> String {
        let base = self.settings.base_url.trim_end_matches('/');
        match &self.settings.project_id {
            Some(project) => format!("{}/projects/{}/accounts:{}", base, project, method),
            None => format!("{}/accounts:{}", base, method),
        }
    }

    fn admin_token(&self) -> Result<&str, GatewayError> {
        self.settings
            .admin_token
            .as_deref()
            .ok_or_else(|| GatewayError::Provider("FIREBASE_ADMIN_TOKEN is not configured".to_string()))
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &B,
        subject: &str,
    ) -> Result<Value, GatewayError> {
        let mut request = self.client.post(url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            error!("Identity provider request failed: {}", e);
            GatewayError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        if status.is_server_error() {
            return Err(GatewayError::Unavailable(format!("provider returned {}", status)));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Provider(format!("unreadable provider response: {}", e)))?;

        if status.is_success() {
            return Ok(payload);
        }

        let err = match serde_json::from_value::<ErrorEnvelope>(payload) {
            Ok(envelope) => map_error_code(&envelope.error.message, subject),
            Err(_) => GatewayError::Provider(format!("provider returned {}", status)),
        };
        warn!("Identity provider rejected request for {}: {}", subject, err);
        Err(err)
    }

    fn decode<T: for<'de> Deserialize<'de>>(payload: Value) -> Result<T, GatewayError> {
        serde_json::from_value(payload).map_err(|e| GatewayError::Provider(format!("unexpected provider response: {}", e)))
    }

    fn admin_body(&self, mut body: Value) -> Value {
        if let (Some(project), Some(map)) = (&self.settings.project_id, body.as_object_mut()) {
            map.insert("targetProjectId".to_string(), Value::String(project.clone()));
        }
        body
    }
}

#[async_trait]
impl AuthGateway for FirebaseAuthGateway {
    async fn sign_in(&self, email: &str, password: &str) -> Result<GatewayIdentity, GatewayError> {
        let body = PasswordRequest { email, password, return_secure_token: true };
        let payload = self.post(&self.public_url("signInWithPassword"), None, &body, email).await?;
        let response: SignInResponse = Self::decode(payload)?;

        debug!("Identity provider signed in {}", email);
        Ok(GatewayIdentity {
            uid: response.local_id,
            email: response.email.unwrap_or_else(|| email.to_string()),
        })
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<String, GatewayError> {
        let body = PasswordRequest { email, password, return_secure_token: true };
        let payload = self.post(&self.public_url("signUp"), None, &body, email).await?;
        let response: SignInResponse = Self::decode(payload)?;
        Ok(response.local_id)
    }

    async fn find_uid(&self, email: &str) -> Result<Option<String>, GatewayError> {
        let token = self.admin_token()?;
        let body = self.admin_body(json!({ "email": [email] }));
        let payload = self.post(&self.admin_url("lookup"), Some(token), &body, email).await?;
        let response: LookupResponse = Self::decode(payload)?;
        Ok(response.users.into_iter().next().map(|u| u.local_id))
    }

    async fn delete_user(&self, uid: &str) -> Result<(), GatewayError> {
        let token = self.admin_token()?;
        let body = self.admin_body(json!({ "localId": uid }));
        self.post(&self.admin_url("delete"), Some(token), &body, uid).await?;
        Ok(())
    }

    async fn update_password(&self, uid: &str, new_password: &str) -> Result<(), GatewayError> {
        let token = self.admin_token()?;
        let body = self.admin_body(json!({ "localId": uid, "password": new_password }));
        self.post(&self.admin_url("update"), Some(token), &body, uid).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_FIREBASE_BASE_URL;

    fn settings(project_id: Option<&str>, admin_token: Option<&str>) -> FirebaseSettings {
        FirebaseSettings {
            api_key: "web-key".to_string(),
            project_id: project_id.map(str::to_string),
            admin_token: admin_token.map(str::to_string),
            base_url: DEFAULT_FIREBASE_BASE_URL.to_string(),
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            map_error_code("EMAIL_EXISTS", "ana@example.com"),
            GatewayError::DuplicateIdentity("ana@example.com".to_string())
        );
        assert_eq!(map_error_code("INVALID_PASSWORD", "x"), GatewayError::InvalidCredentials);
        assert_eq!(map_error_code("EMAIL_NOT_FOUND", "x"), GatewayError::InvalidCredentials);
        assert_eq!(map_error_code("INVALID_LOGIN_CREDENTIALS", "x"), GatewayError::InvalidCredentials);
        assert_eq!(
            map_error_code("USER_NOT_FOUND", "uid-1"),
            GatewayError::UserNotFound("uid-1".to_string())
        );
        assert_eq!(
            map_error_code("WEAK_PASSWORD : Password should be at least 6 characters", "x"),
            GatewayError::WeakPassword("Password should be at least 6 characters".to_string())
        );
        assert!(matches!(map_error_code("OPERATION_NOT_ALLOWED", "x"), GatewayError::Provider(_)));
    }

    #[test]
    fn test_endpoint_urls() {
        let gateway = FirebaseAuthGateway::new(settings(Some("demo"), None));
        assert_eq!(
            gateway.public_url("signUp"),
            "https://identitytoolkit.googleapis.com/v1/accounts:signUp?key=web-key"
        );
        assert_eq!(
            gateway.admin_url("lookup"),
            "https://identitytoolkit.googleapis.com/v1/projects/demo/accounts:lookup"
        );

        let gateway = FirebaseAuthGateway::new(settings(None, None));
        assert_eq!(gateway.admin_url("delete"), "https://identitytoolkit.googleapis.com/v1/accounts:delete");
    }

    #[test]
    fn test_admin_body_carries_project() {
        let gateway = FirebaseAuthGateway::new(settings(Some("demo"), Some("t")));
        let body = gateway.admin_body(json!({ "localId": "uid-1" }));
        assert_eq!(body["targetProjectId"], "demo");
    }

    #[tokio::test]
    async fn test_admin_operations_need_token() {
        let gateway = FirebaseAuthGateway::new(settings(None, None));
        assert!(matches!(
            gateway.delete_user("uid-1").await,
            Err(GatewayError::Provider(_))
        ));
    }
}
