use std::sync::{Arc, Mutex};
use std::collections::{BTreeSet, HashMap};

use crate::models::{ProfileChanges, StoredScreeningRecord, StoredUserProfile};
use super::errors::RepositoryError;

/// In-process storage for screening records and profiles, used when no
/// database pool has been initialized
#[derive(Debug, Clone)]
pub struct InMemoryStorage {
    /// Append-only log of screening records
    records: Arc<Mutex<Vec<StoredScreeningRecord>>>,
    /// Profile documents keyed by email
    profiles: Arc<Mutex<HashMap<String, StoredUserProfile>>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            profiles: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Append a record exactly as given, including records without a timestamp
    pub async fn insert_raw(&self, record: StoredScreeningRecord) -> Result<(), RepositoryError> {
        let mut store = self.records.lock()?;
        store.push(record);
        Ok(())
    }

    /// Get one user's timestamped records within an inclusive range, oldest first
    pub async fn records_by_user(
        &self,
        email: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<StoredScreeningRecord>, RepositoryError> {
        let store = self.records.lock()?;
        let matching = store.iter().filter(|r| r.user_email == email);
        Ok(timestamped_in_range(matching, start, end))
    }

    /// Get every timestamped record, oldest first
    pub async fn all_records(&self) -> Result<Vec<StoredScreeningRecord>, RepositoryError> {
        let store = self.records.lock()?;
        Ok(timestamped_in_range(store.iter(), None, None))
    }

    /// Distinct submitter emails, sorted
    pub async fn distinct_users(&self) -> Result<Vec<String>, RepositoryError> {
        let store = self.records.lock()?;
        let users: BTreeSet<String> = store.iter().map(|r| r.user_email.clone()).collect();
        Ok(users.into_iter().collect())
    }

    /// Get a profile by email
    pub async fn get_profile(&self, email: &str) -> Result<Option<StoredUserProfile>, RepositoryError> {
        let store = self.profiles.lock()?;
        Ok(store.get(email).cloned())
    }

    /// Insert a profile that must not exist yet
    pub async fn create_profile(&self, profile: &StoredUserProfile) -> Result<StoredUserProfile, RepositoryError> {
        let mut store = self.profiles.lock()?;
        if store.contains_key(&profile.email) {
            return Err(RepositoryError::Validation(format!(
                "Profile already exists: {}", profile.email
            )));
        }
        store.insert(profile.email.clone(), profile.clone());
        Ok(profile.clone())
    }

    /// Merge changes into a profile, creating it when missing
    pub async fn merge_profile(&self, email: &str, changes: &ProfileChanges) -> Result<StoredUserProfile, RepositoryError> {
        let mut store = self.profiles.lock()?;
        let profile = store
            .entry(email.to_string())
            .or_insert_with(|| StoredUserProfile::new(email));
        profile.apply(changes);
        Ok(profile.clone())
    }

    /// Delete a profile; returns whether it existed
    pub async fn delete_profile(&self, email: &str) -> Result<bool, RepositoryError> {
        let mut store = self.profiles.lock()?;
        Ok(store.remove(email).is_some())
    }

    /// All profiles, sorted by email
    pub async fn list_profiles(&self) -> Result<Vec<StoredUserProfile>, RepositoryError> {
        let store = self.profiles.lock()?;
        let mut profiles: Vec<StoredUserProfile> = store.values().cloned().collect();
        profiles.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(profiles)
    }
}

/// Keep records that carry a timestamp inside `[start, end]` and sort them
/// ascending. Timestamps are fixed-width UTC strings, so string order is time
/// order.
pub(crate) fn timestamped_in_range<'a>(
    records: impl Iterator<Item = &'a StoredScreeningRecord>,
    start: Option<&str>,
    end: Option<&str>,
) -> Vec<StoredScreeningRecord> {
    let mut result: Vec<StoredScreeningRecord> = records
        .filter(|record| match record.recorded_at.as_deref() {
            None => false,
            Some(ts) => {
                start.map_or(true, |s| ts >= s) && end.map_or(true, |e| ts <= e)
            }
        })
        .cloned()
        .collect();

    result.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
    result
}
