//! Mock stores for testing, available to other crates through the `mock` feature

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use async_trait::async_trait;
use uuid::Uuid;

use crate::database::DatabaseError;
use crate::models::{NewScreeningRecord, ProfileChanges, StoredScreeningRecord, StoredUserProfile};
use super::errors::RepositoryError;
use super::in_memory::timestamped_in_range;
use super::{storage_timestamp, ProfileStore, RecordStore};

/// A plausible record for tests
pub fn sample_record(email: &str, glucose: i32) -> NewScreeningRecord {
    NewScreeningRecord {
        user_email: email.to_string(),
        user_name: "Test User".to_string(),
        user_role: "user".to_string(),
        result: if glucose >= 126 { "risk" } else { "no-risk" }.to_string(),
        pregnancies: 1,
        glucose,
        blood_pressure: 80,
        skin_thickness: 20.0,
        insulin: 80,
        weight_kg: 70.0,
        height_cm: 175.0,
        bmi: 22.857142857142858,
        diabetes_pedigree: 0.2,
        age: 30,
        probability: Some(0.25),
    }
}

/// Mock implementation of RecordStore for testing
pub struct MockRecordStore {
    records: Mutex<Vec<StoredScreeningRecord>>,
    fail_appends: bool,
    fail_reads: bool,
}

impl Default for MockRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRecordStore {
    /// Create a new empty mock store
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail_appends: false,
            fail_reads: false,
        }
    }

    /// Create a mock store with predefined records, kept as given
    pub fn with_records(records: Vec<StoredScreeningRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::new()
        }
    }

    /// Make every append fail as if the store were unreachable
    pub fn failing_appends(mut self) -> Self {
        self.fail_appends = true;
        self
    }

    /// Make every read fail as if the store were unreachable
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Number of records held, including untimestamped ones
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn unreachable() -> RepositoryError {
        RepositoryError::Database(DatabaseError::GenericError("store unreachable".to_string()))
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn append(&self, record: NewScreeningRecord) -> Result<StoredScreeningRecord, RepositoryError> {
        if self.fail_appends {
            return Err(Self::unreachable());
        }
        let stored = record.into_stored(Uuid::new_v4().to_string(), storage_timestamp());
        self.records.lock()?.push(stored.clone());
        Ok(stored)
    }

    async fn query_by_user(
        &self,
        email: &str,
        start: Option<String>,
        end: Option<String>,
    ) -> Result<Vec<StoredScreeningRecord>, RepositoryError> {
        if self.fail_reads {
            return Err(Self::unreachable());
        }
        let records = self.records.lock()?;
        Ok(timestamped_in_range(
            records.iter().filter(|r| r.user_email == email),
            start.as_deref(),
            end.as_deref(),
        ))
    }

    async fn query_all(&self) -> Result<Vec<StoredScreeningRecord>, RepositoryError> {
        if self.fail_reads {
            return Err(Self::unreachable());
        }
        let records = self.records.lock()?;
        Ok(timestamped_in_range(records.iter(), None, None))
    }

    async fn distinct_users(&self) -> Result<Vec<String>, RepositoryError> {
        if self.fail_reads {
            return Err(Self::unreachable());
        }
        let records = self.records.lock()?;
        let users: BTreeSet<String> = records.iter().map(|r| r.user_email.clone()).collect();
        Ok(users.into_iter().collect())
    }
}

/// Mock implementation of ProfileStore for testing
#[derive(Default)]
pub struct MockProfileStore {
    profiles: Mutex<HashMap<String, StoredUserProfile>>,
}

impl MockProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock store with predefined profiles
    pub fn with_profiles(profiles: Vec<StoredUserProfile>) -> Self {
        let map = profiles.into_iter().map(|p| (p.email.clone(), p)).collect();
        Self { profiles: Mutex::new(map) }
    }
}

#[async_trait]
impl ProfileStore for MockProfileStore {
    async fn get(&self, email: &str) -> Result<Option<StoredUserProfile>, RepositoryError> {
        Ok(self.profiles.lock()?.get(email).cloned())
    }

    async fn create(&self, profile: StoredUserProfile) -> Result<StoredUserProfile, RepositoryError> {
        let mut profiles = self.profiles.lock()?;
        if profiles.contains_key(&profile.email) {
            return Err(RepositoryError::Validation(format!("Profile already exists: {}", profile.email)));
        }
        profiles.insert(profile.email.clone(), profile.clone());
        Ok(profile)
    }

    async fn merge(&self, email: &str, changes: ProfileChanges) -> Result<StoredUserProfile, RepositoryError> {
        let mut profiles = self.profiles.lock()?;
        let profile = profiles
            .entry(email.to_string())
            .or_insert_with(|| StoredUserProfile::new(email));
        profile.apply(&changes);
        Ok(profile.clone())
    }

    async fn delete(&self, email: &str) -> Result<bool, RepositoryError> {
        Ok(self.profiles.lock()?.remove(email).is_some())
    }

    async fn list(&self) -> Result<Vec<StoredUserProfile>, RepositoryError> {
        let mut profiles: Vec<StoredUserProfile> = self.profiles.lock()?.values().cloned().collect();
        profiles.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(profiles)
    }
}
