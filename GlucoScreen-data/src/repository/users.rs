use async_trait::async_trait;

use crate::models::{ProfileChanges, StoredUserProfile};
use crate::database::DatabasePool;
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;

/// Store of user profile documents keyed by email
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Get a profile by email
    async fn get(&self, email: &str) -> Result<Option<StoredUserProfile>, RepositoryError>;

    /// Create a profile; fails with `Validation` when one already exists
    async fn create(&self, profile: StoredUserProfile) -> Result<StoredUserProfile, RepositoryError>;

    /// Set-with-merge: only provided fields change, a missing document is created
    async fn merge(&self, email: &str, changes: ProfileChanges) -> Result<StoredUserProfile, RepositoryError>;

    /// Delete a profile; returns whether it existed
    async fn delete(&self, email: &str) -> Result<bool, RepositoryError>;

    /// Every profile
    async fn list(&self) -> Result<Vec<StoredUserProfile>, RepositoryError>;
}

#[derive(Debug, Clone)]
enum Backend {
    Database(DatabasePool),
    Memory(InMemoryStorage),
}

/// Repository for user profiles, bound to one backend at construction
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    backend: Backend,
}

impl ProfileRepository {
    pub fn with_pool(pool: DatabasePool) -> Self {
        Self { backend: Backend::Database(pool) }
    }

    pub fn in_memory() -> Self {
        Self::with_storage(InMemoryStorage::new())
    }

    pub fn with_storage(storage: InMemoryStorage) -> Self {
        Self { backend: Backend::Memory(storage) }
    }
}

#[async_trait]
impl ProfileStore for ProfileRepository {
    async fn get(&self, email: &str) -> Result<Option<StoredUserProfile>, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::get_profile(pool, email).await,
            Backend::Memory(storage) => storage.get_profile(email).await,
        }
    }

    async fn create(&self, profile: StoredUserProfile) -> Result<StoredUserProfile, RepositoryError> {
        if profile.email.trim().is_empty() {
            return Err(RepositoryError::Validation("Profile email must not be empty".to_string()));
        }

        match &self.backend {
            Backend::Database(pool) => {
                DatabaseStorage::create_profile(pool, &profile).await?;
                Ok(profile)
            }
            Backend::Memory(storage) => storage.create_profile(&profile).await,
        }
    }

    async fn merge(&self, email: &str, changes: ProfileChanges) -> Result<StoredUserProfile, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::merge_profile(pool, email, &changes).await,
            Backend::Memory(storage) => storage.merge_profile(email, &changes).await,
        }
    }

    async fn delete(&self, email: &str) -> Result<bool, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::delete_profile(pool, email).await,
            Backend::Memory(storage) => storage.delete_profile(email).await,
        }
    }

    async fn list(&self) -> Result<Vec<StoredUserProfile>, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::list_profiles(pool).await,
            Backend::Memory(storage) => storage.list_profiles().await,
        }
    }
}
