use rusqlite::Connection;
use tracing::info;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    info!("Running SQLite migrations");

    create_screening_results_table(conn)?;
    create_screening_results_index(conn)?;
    create_user_profiles_table(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Create the append-only screening results table.
///
/// `recorded_at` is nullable: rows imported from older stores may lack it and
/// are skipped by history queries.
fn create_screening_results_table(conn: &Connection) -> Result<(), String> {
    info!("Creating screening_results table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS screening_results (
            id TEXT PRIMARY KEY,
            user_email TEXT NOT NULL,
            user_name TEXT NOT NULL DEFAULT '',
            user_role TEXT NOT NULL DEFAULT 'user',
            result TEXT NOT NULL,
            pregnancies INTEGER NOT NULL,
            glucose INTEGER NOT NULL,
            blood_pressure INTEGER NOT NULL,
            skin_thickness REAL NOT NULL,
            insulin INTEGER NOT NULL,
            weight_kg REAL NOT NULL,
            height_cm REAL NOT NULL,
            bmi REAL NOT NULL,
            diabetes_pedigree REAL NOT NULL,
            age INTEGER NOT NULL,
            probability REAL,
            recorded_at TEXT
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Index for per-user history queries ordered by time
fn create_screening_results_index(conn: &Connection) -> Result<(), String> {
    info!("Creating index on (user_email, recorded_at)");

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_screening_results_user_time
        ON screening_results (user_email, recorded_at)",
        [],
    ).map_err(|e| format!("Failed to create index: {}", e))?;

    Ok(())
}

/// Create the user profiles table, keyed by identity
fn create_user_profiles_table(conn: &Connection) -> Result<(), String> {
    info!("Creating user_profiles table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS user_profiles (
            email TEXT PRIMARY KEY,
            name TEXT,
            lastname TEXT,
            phone TEXT,
            role TEXT NOT NULL DEFAULT 'user',
            blood_type TEXT,
            emergency_contact TEXT,
            gender TEXT,
            chronic_disease TEXT,
            allergy TEXT,
            created_at TEXT,
            updated_at TEXT
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}
