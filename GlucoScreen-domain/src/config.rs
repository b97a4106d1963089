//! Application settings read from the environment (`.env` is loaded by the binary)

use std::env;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// Default location of the classifier artifact
pub const DEFAULT_MODEL_PATH: &str = "models/diabetes_forest.json";

/// Default Identity Toolkit endpoint
pub const DEFAULT_FIREBASE_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("Environment variable not found: {0}")]
    Missing(String),

    /// A variable is set to something unusable
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },
}

/// Which identity provider backs authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProvider {
    /// In-process accounts
    Local,
    /// Firebase Identity Toolkit
    Firebase,
}

/// Settings for the Firebase identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseSettings {
    pub api_key: String,
    pub project_id: Option<String>,
    /// OAuth bearer token used for admin account operations
    pub admin_token: Option<String>,
    pub base_url: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub auth_provider: AuthProvider,
    pub firebase: Option<FirebaseSettings>,
    /// Bootstrap admin account for the local provider
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub port: u16,
    pub app_env: String,
    pub data_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            auth_provider: AuthProvider::Local,
            firebase: None,
            admin_email: None,
            admin_password: None,
            port: 3000,
            app_env: "development".to_string(),
            data_dir: "./data".to_string(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let model_path = env::var("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);

        let auth_provider = match env::var("AUTH_PROVIDER") {
            Ok(value) => match value.to_lowercase().as_str() {
                "local" => AuthProvider::Local,
                "firebase" => AuthProvider::Firebase,
                _ => return Err(ConfigError::InvalidValue { var: "AUTH_PROVIDER".to_string(), value }),
            },
            Err(_) => AuthProvider::Local,
        };

        let firebase = match auth_provider {
            AuthProvider::Firebase => {
                let api_key = env::var("FIREBASE_API_KEY")
                    .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY".to_string()))?;
                let admin_token = env::var("FIREBASE_ADMIN_TOKEN").ok();
                if admin_token.is_none() {
                    warn!("FIREBASE_ADMIN_TOKEN not set, admin account operations will fail");
                }
                Some(FirebaseSettings {
                    api_key,
                    project_id: env::var("FIREBASE_PROJECT_ID").ok(),
                    admin_token,
                    base_url: env::var("FIREBASE_BASE_URL")
                        .unwrap_or_else(|_| DEFAULT_FIREBASE_BASE_URL.to_string()),
                })
            }
            AuthProvider::Local => None,
        };

        let port = match env::var("PORT") {
            Ok(value) => value.parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue { var: "PORT".to_string(), value })?,
            Err(_) => defaults.port,
        };

        let config = Self {
            model_path,
            auth_provider,
            firebase,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            port,
            app_env: env::var("APP_ENV").unwrap_or(defaults.app_env),
            data_dir: env::var("DATA_DIR").unwrap_or(defaults.data_dir),
        };

        info!(
            "Configuration loaded: env={}, auth_provider={:?}, model={}",
            config.app_env,
            config.auth_provider,
            config.model_path.display()
        );

        Ok(config)
    }

    /// Whether the service runs in production mode
    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.model_path, PathBuf::from("models/diabetes_forest.json"));
        assert_eq!(config.auth_provider, AuthProvider::Local);
        assert_eq!(config.port, 3000);
        assert!(!config.is_production());
    }
}
