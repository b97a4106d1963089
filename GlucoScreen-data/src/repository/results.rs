use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::models::{NewScreeningRecord, StoredScreeningRecord};
use crate::database::DatabasePool;
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;
use super::storage_timestamp;

/// Append-only store of screening records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append a record, assigning its id and timestamp
    async fn append(&self, record: NewScreeningRecord) -> Result<StoredScreeningRecord, RepositoryError>;

    /// A user's records inside an inclusive timestamp range, oldest first.
    /// Records without a timestamp are never returned.
    async fn query_by_user(
        &self,
        email: &str,
        start: Option<String>,
        end: Option<String>,
    ) -> Result<Vec<StoredScreeningRecord>, RepositoryError>;

    /// Every timestamped record, oldest first
    async fn query_all(&self) -> Result<Vec<StoredScreeningRecord>, RepositoryError>;

    /// Distinct identities that have submitted at least one record
    async fn distinct_users(&self) -> Result<Vec<String>, RepositoryError>;
}

#[derive(Debug, Clone)]
enum Backend {
    Database(DatabasePool),
    Memory(InMemoryStorage),
}

/// Repository for screening records.
///
/// The backend (a SQLite pool or in-process storage) is chosen once at
/// construction. Failures of the chosen backend are returned to the caller.
#[derive(Debug, Clone)]
pub struct ResultRepository {
    backend: Backend,
}

impl ResultRepository {
    /// Create a repository over an explicit pool
    pub fn with_pool(pool: DatabasePool) -> Self {
        Self { backend: Backend::Database(pool) }
    }

    /// Create a repository over fresh in-process storage
    pub fn in_memory() -> Self {
        Self::with_storage(InMemoryStorage::new())
    }

    /// Create a repository over existing in-process storage
    pub fn with_storage(storage: InMemoryStorage) -> Self {
        Self { backend: Backend::Memory(storage) }
    }
}

#[async_trait]
impl RecordStore for ResultRepository {
    async fn append(&self, record: NewScreeningRecord) -> Result<StoredScreeningRecord, RepositoryError> {
        let stored = record.into_stored(Uuid::new_v4().to_string(), storage_timestamp());

        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::insert_record(pool, &stored).await?,
            Backend::Memory(storage) => storage.insert_raw(stored.clone()).await?,
        }

        debug!("Appended screening record {} for {}", stored.id, stored.user_email);
        Ok(stored)
    }

    async fn query_by_user(
        &self,
        email: &str,
        start: Option<String>,
        end: Option<String>,
    ) -> Result<Vec<StoredScreeningRecord>, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => {
                DatabaseStorage::records_by_user(pool, email, start.as_deref(), end.as_deref()).await
            }
            Backend::Memory(storage) => {
                storage.records_by_user(email, start.as_deref(), end.as_deref()).await
            }
        }
    }

    async fn query_all(&self) -> Result<Vec<StoredScreeningRecord>, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::all_records(pool).await,
            Backend::Memory(storage) => storage.all_records().await,
        }
    }

    async fn distinct_users(&self) -> Result<Vec<String>, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::distinct_users(pool).await,
            Backend::Memory(storage) => storage.distinct_users().await,
        }
    }
}
