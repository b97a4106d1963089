use async_trait::async_trait;
use tracing::{debug, error, info};

use gluco_screen_data::repository::{storage_timestamp, ProfileStore, RepositoryError};

use crate::entities::conversions;
use crate::entities::user::{ProfileUpdate, Role, UserProfile};
use crate::errors::ScreeningError;

/// Trait for profile operations on the caller's own profile
#[async_trait]
pub trait ProfileServiceTrait: Send + Sync {
    /// The stored profile, or defaults when none exists
    async fn get_profile(&self, email: &str) -> Result<UserProfile, ScreeningError>;

    /// Merge the provided fields into the profile
    async fn update_profile(&self, email: &str, update: ProfileUpdate) -> Result<UserProfile, ScreeningError>;
}

pub struct ProfileService<P: ProfileStore> {
    profiles: P,
}

impl<P: ProfileStore> ProfileService<P> {
    pub fn new(profiles: P) -> Self {
        Self { profiles }
    }

    fn map_repo_error(&self, err: RepositoryError) -> ScreeningError {
        error!("Profile store error: {}", err);
        ScreeningError::from(err)
    }
}

#[async_trait]
impl<P: ProfileStore> ProfileServiceTrait for ProfileService<P> {
    async fn get_profile(&self, email: &str) -> Result<UserProfile, ScreeningError> {
        let stored = self.profiles.get(email).await.map_err(|e| self.map_repo_error(e))?;
        Ok(match stored {
            Some(profile) => conversions::convert_to_domain_profile(profile),
            None => {
                debug!("No profile stored for {}, returning defaults", email);
                UserProfile::default_for(email)
            }
        })
    }

    async fn update_profile(&self, email: &str, update: ProfileUpdate) -> Result<UserProfile, ScreeningError> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(ScreeningError::ValidationError("name must not be empty".to_string()));
            }
        }

        let role = self
            .profiles
            .get(email)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .map(|p| Role::from_stored(&p.role))
            .unwrap_or_default();

        let changes = conversions::convert_to_data_profile_changes(
            &update,
            role != Role::Admin,
            storage_timestamp(),
        );

        let stored = self
            .profiles
            .merge(email, changes)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!("Updated profile of {}", email);
        Ok(conversions::convert_to_domain_profile(stored))
    }
}
