// Repository module structure
pub mod errors;
mod in_memory;
mod results;
mod storage;
mod users;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use in_memory::InMemoryStorage;
pub use results::{RecordStore, ResultRepository};
pub use users::{ProfileRepository, ProfileStore};

/// Current time in the storage timestamp format (RFC 3339, UTC, milliseconds)
pub fn storage_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// Hand-written doubles, shared with the domain crate through the mock feature
#[cfg(any(test, feature = "mock"))]
pub mod tests;
