//! Database connection module for the GlucoScreen application
//!
//! Screening results and user profiles live in SQLite. The pool is created
//! once at startup and shared through a process-wide `OnceCell`; repositories
//! that are constructed before (or without) a pool use in-process storage.

use std::env;
use std::sync::Arc;
use thiserror::Error;
use once_cell::sync::OnceCell;
use tracing::{info, error};

use super::migrations::run_sqlite_migrations;

/// Global database pool used throughout the application
static DB_POOL: OnceCell<DatabasePool> = OnceCell::new();

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    /// SQLite database (file-based)
    Sqlite,
}

impl DatabaseType {
    /// Convert from string to database type
    pub fn from_str(s: &str) -> Result<Self, DatabaseError> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(DatabaseType::Sqlite),
            _ => Err(DatabaseError::UnsupportedDatabaseType(s.to_string())),
        }
    }
}

/// Database connection pool
#[derive(Debug, Clone)]
pub enum DatabasePool {
    /// SQLite connection pool
    SQLite(Arc<r2d2::Pool<r2d2_sqlite::SqliteConnectionManager>>),
}

/// Database error
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Environment variable not found
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    /// SQLite error
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// SQLite connection pool error
    #[error("SQLite connection pool error: {0}")]
    SqlitePoolError(#[from] r2d2::Error),

    /// Database pool already initialized
    #[error("Database pool is already initialized")]
    PoolAlreadyInitialized,

    /// Database pool not initialized
    #[error("Database pool is not initialized")]
    PoolNotInitialized,

    /// Unsupported database type
    #[error("Unsupported database type: {0}")]
    UnsupportedDatabaseType(String),

    /// Database directory could not be created
    #[error("Cannot create database directory: {0}")]
    DirectoryError(String),

    /// Migration error
    #[error("Database migration error: {0}")]
    MigrationError(String),

    /// Generic database error
    #[error("Database error: {0}")]
    GenericError(String),
}

impl From<String> for DatabaseError {
    fn from(error: String) -> Self {
        DatabaseError::GenericError(error)
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database type
    pub db_type: DatabaseType,
    /// Path to SQLite database file
    pub sqlite_path: Option<String>,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DatabaseType::Sqlite,
            sqlite_path: Some("./data/gluco_screen.db".to_string()),
            max_connections: 10,
            timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration from environment variables
    pub fn from_env() -> Result<Self, DatabaseError> {
        let db_type_str = env::var("DB_TYPE").unwrap_or_else(|_| "sqlite".to_string());
        let db_type = DatabaseType::from_str(&db_type_str)?;

        let sqlite_path = env::var("DB_SQLITE_PATH").ok();
        match sqlite_path {
            Some(ref path) => info!("Using SQLite database at: {}", path),
            None => info!("No DB_SQLITE_PATH provided, will use default path: data/gluco_screen.db"),
        }

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(10);

        let timeout_seconds = env::var("DB_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        info!("Database configuration: max_connections={}, timeout={}s",
            max_connections, timeout_seconds);

        Ok(DatabaseConfig {
            db_type,
            sqlite_path,
            max_connections,
            timeout_seconds,
        })
    }
}

/// Initialize the global database connection pool from the environment and
/// run migrations on it.
pub fn initialize_database_pool() -> Result<(), DatabaseError> {
    if DB_POOL.get().is_some() {
        return Err(DatabaseError::PoolAlreadyInitialized);
    }

    let config = DatabaseConfig::from_env()?;

    info!("Initializing database pool with type: {:?}", config.db_type);

    let pool = match config.db_type {
        DatabaseType::Sqlite => create_sqlite_pool(&config)?,
    };

    DB_POOL.set(pool).map_err(|_| DatabaseError::PoolAlreadyInitialized)
}

/// Get the database connection pool
pub fn get_db_pool() -> Result<DatabasePool, DatabaseError> {
    DB_POOL.get()
        .cloned()
        .ok_or(DatabaseError::PoolNotInitialized)
}

/// Create a migrated SQLite pool for the configured file.
///
/// A file that cannot be created or opened is an error; callers decide
/// whether to run without durable storage.
pub fn create_sqlite_pool(config: &DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    use rusqlite::OpenFlags;
    use std::fs;
    use std::path::Path;

    let sqlite_path = config.sqlite_path.clone()
        .unwrap_or_else(|| "data/gluco_screen.db".to_string());

    info!("Initializing SQLite database at: {}", sqlite_path);

    if let Some(parent) = Path::new(&sqlite_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            info!("Creating parent directory: {:?}", parent);
            fs::create_dir_all(parent).map_err(|e| {
                error!("Failed to create directory {:?}: {}", parent, e);
                DatabaseError::DirectoryError(format!("{}: {}", parent.display(), e))
            })?;
        }
    }

    let manager = r2d2_sqlite::SqliteConnectionManager::file(&sqlite_path)
        .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE);

    let pool = r2d2::Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .build(manager)
        .map_err(|e| {
            error!("Failed to create SQLite connection pool: {}", e);
            DatabaseError::SqlitePoolError(e)
        })?;

    let conn = pool.get().map_err(|e| {
        error!("Failed to connect to SQLite database: {}", e);
        DatabaseError::SqlitePoolError(e)
    })?;

    run_sqlite_migrations(&conn).map_err(DatabaseError::MigrationError)?;

    info!("SQLite connection pool created successfully");
    Ok(DatabasePool::SQLite(Arc::new(pool)))
}

/// Open a migrated in-memory SQLite database.
///
/// Every connection to `:memory:` is a separate database, so the pool is
/// capped at a single connection.
pub fn open_in_memory_pool() -> Result<DatabasePool, DatabaseError> {
    info!("Initializing in-memory SQLite database");

    let manager = r2d2_sqlite::SqliteConnectionManager::memory();
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .build(manager)?;

    let conn = pool.get()?;
    run_sqlite_migrations(&conn).map_err(DatabaseError::MigrationError)?;

    info!("In-memory SQLite database initialized successfully");
    Ok(DatabasePool::SQLite(Arc::new(pool)))
}

/// Describe a pool: backing file (or in-memory) and connection stats
pub fn describe_pool(pool: &DatabasePool) -> String {
    match pool {
        DatabasePool::SQLite(pool) => {
            let conn = match pool.get() {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to get SQLite connection: {}", e);
                    return format!("SQLite connection error: {}", e);
                }
            };

            let location = match conn.query_row(
                "PRAGMA database_list",
                [],
                |row| row.get::<_, String>(2),
            ) {
                Ok(path) if path.is_empty() || path == ":memory:" => "SQLite in-memory database".to_string(),
                Ok(path) => format!("SQLite database at {}", path),
                Err(_) => "SQLite database (path unknown)".to_string(),
            };

            let state = pool.state();
            format!("{} (connections: active={}, idle={})",
                location,
                state.connections,
                state.idle_connections
            )
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.db_type, DatabaseType::Sqlite);
        assert!(config.sqlite_path.is_some());
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_database_type_from_str() {
        assert_eq!(DatabaseType::from_str("sqlite").unwrap(), DatabaseType::Sqlite);
        assert_eq!(DatabaseType::from_str("SQLite").unwrap(), DatabaseType::Sqlite);
        assert!(DatabaseType::from_str("postgres").is_err());
    }

    #[test]
    fn test_in_memory_pool_is_migrated() {
        let pool = open_in_memory_pool().unwrap();
        let DatabasePool::SQLite(pool) = pool;
        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM screening_results", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let config = DatabaseConfig {
            sqlite_path: Some("/proc/no_such_dir/gluco.db".to_string()),
            timeout_seconds: 1,
            ..DatabaseConfig::default()
        };
        let result = create_sqlite_pool(&config);
        assert!(matches!(result, Err(DatabaseError::DirectoryError(_))));
    }

    #[test]
    fn test_file_pool_is_migrated() {
        let dir = std::env::temp_dir().join(format!("gluco_screen_{}", uuid::Uuid::new_v4()));
        let config = DatabaseConfig {
            sqlite_path: Some(dir.join("results.db").to_string_lossy().into_owned()),
            ..DatabaseConfig::default()
        };
        let pool = create_sqlite_pool(&config).unwrap();
        assert!(describe_pool(&pool).contains("results.db"));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_describe_in_memory_pool() {
        let pool = open_in_memory_pool().unwrap();
        assert!(describe_pool(&pool).contains("in-memory"));
    }
}
