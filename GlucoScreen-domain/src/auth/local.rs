use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use super::gateway::{AuthGateway, GatewayError, GatewayIdentity};

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    salt: String,
    password_hash: String,
}

/// In-process identity provider with salted SHA-256 password hashes
#[derive(Debug, Default)]
pub struct LocalAuthGateway {
    /// Accounts keyed by lowercase email
    accounts: RwLock<HashMap<String, Account>>,
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    STANDARD.encode(hasher.finalize())
}

fn new_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

fn check_password(password: &str) -> Result<(), GatewayError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(GatewayError::WeakPassword(format!(
            "Password should be at least {} characters", MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

fn lock_error<T>(_: PoisonError<T>) -> GatewayError {
    GatewayError::Provider("account table lock poisoned".to_string())
}

impl LocalAuthGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(email: &str) -> String {
        email.trim().to_lowercase()
    }

    fn find_by_uid<'a>(accounts: &'a mut HashMap<String, Account>, uid: &str) -> Option<&'a mut Account> {
        accounts.values_mut().find(|a| a.uid == uid)
    }
}

#[async_trait]
impl AuthGateway for LocalAuthGateway {
    async fn sign_in(&self, email: &str, password: &str) -> Result<GatewayIdentity, GatewayError> {
        let accounts = self.accounts.read().map_err(lock_error)?;
        let account = accounts.get(&Self::key(email)).ok_or(GatewayError::InvalidCredentials)?;

        if hash_password(&account.salt, password) != account.password_hash {
            debug!("Password mismatch for {}", email);
            return Err(GatewayError::InvalidCredentials);
        }

        Ok(GatewayIdentity {
            uid: account.uid.clone(),
            email: account.email.clone(),
        })
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<String, GatewayError> {
        check_password(password)?;

        let key = Self::key(email);
        let mut accounts = self.accounts.write().map_err(lock_error)?;
        if accounts.contains_key(&key) {
            return Err(GatewayError::DuplicateIdentity(key));
        }

        let salt = new_salt();
        let account = Account {
            uid: Uuid::new_v4().to_string(),
            email: key.clone(),
            password_hash: hash_password(&salt, password),
            salt,
        };
        let uid = account.uid.clone();
        accounts.insert(key, account);

        info!("Created local account {}", email);
        Ok(uid)
    }

    async fn find_uid(&self, email: &str) -> Result<Option<String>, GatewayError> {
        let accounts = self.accounts.read().map_err(lock_error)?;
        Ok(accounts.get(&Self::key(email)).map(|a| a.uid.clone()))
    }

    async fn delete_user(&self, uid: &str) -> Result<(), GatewayError> {
        let mut accounts = self.accounts.write().map_err(lock_error)?;
        let before = accounts.len();
        accounts.retain(|_, a| a.uid != uid);
        if accounts.len() == before {
            return Err(GatewayError::UserNotFound(uid.to_string()));
        }
        Ok(())
    }

    async fn update_password(&self, uid: &str, new_password: &str) -> Result<(), GatewayError> {
        check_password(new_password)?;

        let mut accounts = self.accounts.write().map_err(lock_error)?;
        let account = Self::find_by_uid(&mut accounts, uid)
            .ok_or_else(|| GatewayError::UserNotFound(uid.to_string()))?;
        account.salt = new_salt();
        account.password_hash = hash_password(&account.salt, new_password);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_sign_in() {
        let gateway = LocalAuthGateway::new();
        let uid = gateway.create_user("Ana@Example.com", "secret1").await.unwrap();

        let identity = gateway.sign_in("ana@example.com", "secret1").await.unwrap();
        assert_eq!(identity.uid, uid);
        assert_eq!(identity.email, "ana@example.com");

        assert_eq!(
            gateway.sign_in("ana@example.com", "wrong!!").await.unwrap_err(),
            GatewayError::InvalidCredentials
        );
        assert_eq!(
            gateway.sign_in("nobody@example.com", "secret1").await.unwrap_err(),
            GatewayError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn test_duplicate_and_weak_password() {
        let gateway = LocalAuthGateway::new();
        gateway.create_user("ana@example.com", "secret1").await.unwrap();

        assert!(matches!(
            gateway.create_user("ANA@example.com", "secret2").await,
            Err(GatewayError::DuplicateIdentity(_))
        ));
        assert!(matches!(
            gateway.create_user("bo@example.com", "123").await,
            Err(GatewayError::WeakPassword(_))
        ));
    }

    #[tokio::test]
    async fn test_update_password_and_delete() {
        let gateway = LocalAuthGateway::new();
        let uid = gateway.create_user("ana@example.com", "secret1").await.unwrap();

        gateway.update_password(&uid, "changed1").await.unwrap();
        assert!(gateway.sign_in("ana@example.com", "secret1").await.is_err());
        assert!(gateway.sign_in("ana@example.com", "changed1").await.is_ok());

        gateway.delete_user(&uid).await.unwrap();
        assert_eq!(gateway.find_uid("ana@example.com").await.unwrap(), None);
        assert!(matches!(gateway.delete_user(&uid).await, Err(GatewayError::UserNotFound(_))));
    }

    #[test]
    fn test_hash_depends_on_salt() {
        assert_ne!(hash_password("a", "secret1"), hash_password("b", "secret1"));
        assert_eq!(hash_password("a", "secret1"), hash_password("a", "secret1"));
    }
}
