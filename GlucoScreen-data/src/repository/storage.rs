use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use crate::models::{ProfileChanges, StoredScreeningRecord, StoredUserProfile};
use crate::database::DatabasePool;
use super::errors::RepositoryError;

const RECORD_COLUMNS: &str = "id, user_email, user_name, user_role, result, pregnancies, glucose,
     blood_pressure, skin_thickness, insulin, weight_kg, height_cm, bmi, diabetes_pedigree,
     age, probability, recorded_at";

const PROFILE_COLUMNS: &str = "email, name, lastname, phone, role, blood_type, emergency_contact,
     gender, chronic_disease, allergy, created_at, updated_at";

/// Database storage operations for screening records and profiles
pub struct DatabaseStorage;

impl DatabaseStorage {
    /// Store a screening record in the database
    pub async fn insert_record(pool: &DatabasePool, record: &StoredScreeningRecord) -> Result<(), RepositoryError> {
        debug!("Storing screening record in database: id={}", record.id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                conn.execute(
                    &format!(
                        "INSERT INTO screening_results ({}) VALUES
                         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                        RECORD_COLUMNS
                    ),
                    params![
                        record.id,
                        record.user_email,
                        record.user_name,
                        record.user_role,
                        record.result,
                        record.pregnancies,
                        record.glucose,
                        record.blood_pressure,
                        record.skin_thickness,
                        record.insulin,
                        record.weight_kg,
                        record.height_cm,
                        record.bmi,
                        record.diabetes_pedigree,
                        record.age,
                        record.probability,
                        record.recorded_at,
                    ],
                )?;

                Ok(())
            }
        }
    }

    /// Get one user's timestamped records within an inclusive range, oldest first
    pub async fn records_by_user(
        pool: &DatabasePool,
        email: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<StoredScreeningRecord>, RepositoryError> {
        debug!("Getting screening records for {} from database", email);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let mut query = format!(
                    "SELECT {} FROM screening_results WHERE user_email = ? AND recorded_at IS NOT NULL",
                    RECORD_COLUMNS
                );
                let mut params: Vec<&dyn rusqlite::ToSql> = vec![&email];

                if let Some(ref start) = start {
                    query.push_str(" AND recorded_at >= ?");
                    params.push(start as &dyn rusqlite::ToSql);
                }

                if let Some(ref end) = end {
                    query.push_str(" AND recorded_at <= ?");
                    params.push(end as &dyn rusqlite::ToSql);
                }

                query.push_str(" ORDER BY recorded_at ASC");

                let mut stmt = conn.prepare(&query)?;
                let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), map_record)?;

                let mut result = Vec::new();
                for record in rows {
                    result.push(record?);
                }

                Ok(result)
            }
        }
    }

    /// Get every timestamped record, oldest first
    pub async fn all_records(pool: &DatabasePool) -> Result<Vec<StoredScreeningRecord>, RepositoryError> {
        debug!("Getting all screening records from database");

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM screening_results WHERE recorded_at IS NOT NULL ORDER BY recorded_at ASC",
                    RECORD_COLUMNS
                ))?;
                let rows = stmt.query_map([], map_record)?;

                let mut result = Vec::new();
                for record in rows {
                    result.push(record?);
                }

                Ok(result)
            }
        }
    }

    /// Distinct submitter emails, sorted
    pub async fn distinct_users(pool: &DatabasePool) -> Result<Vec<String>, RepositoryError> {
        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let mut stmt = conn.prepare(
                    "SELECT DISTINCT user_email FROM screening_results ORDER BY user_email"
                )?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

                let mut result = Vec::new();
                for email in rows {
                    result.push(email?);
                }

                Ok(result)
            }
        }
    }

    /// Get a profile by email
    pub async fn get_profile(pool: &DatabasePool, email: &str) -> Result<Option<StoredUserProfile>, RepositoryError> {
        debug!("Getting profile from database: email={}", email);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let profile = conn.query_row(
                    &format!("SELECT {} FROM user_profiles WHERE email = ?", PROFILE_COLUMNS),
                    [email],
                    map_profile,
                ).optional()?;

                Ok(profile)
            }
        }
    }

    /// Insert a profile that must not exist yet
    pub async fn create_profile(pool: &DatabasePool, profile: &StoredUserProfile) -> Result<(), RepositoryError> {
        debug!("Creating profile in database: email={}", profile.email);

        match pool {
            DatabasePool::SQLite(pool) => {
                let mut conn = pool.get()?;
                let tx = conn.transaction()?;

                let exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM user_profiles WHERE email = ?)",
                    [&profile.email],
                    |row| row.get(0),
                )?;
                if exists {
                    return Err(RepositoryError::Validation(format!(
                        "Profile already exists: {}", profile.email
                    )));
                }

                write_profile(&tx, profile)?;
                tx.commit()?;
                Ok(())
            }
        }
    }

    /// Merge changes into a profile inside one transaction, creating it when missing
    pub async fn merge_profile(
        pool: &DatabasePool,
        email: &str,
        changes: &ProfileChanges,
    ) -> Result<StoredUserProfile, RepositoryError> {
        debug!("Merging profile changes in database: email={}", email);

        match pool {
            DatabasePool::SQLite(pool) => {
                let mut conn = pool.get()?;
                let tx = conn.transaction()?;

                let mut profile = tx.query_row(
                    &format!("SELECT {} FROM user_profiles WHERE email = ?", PROFILE_COLUMNS),
                    [email],
                    map_profile,
                ).optional()?
                .unwrap_or_else(|| StoredUserProfile::new(email));

                profile.apply(changes);
                write_profile(&tx, &profile)?;
                tx.commit()?;

                Ok(profile)
            }
        }
    }

    /// Delete a profile; returns whether it existed
    pub async fn delete_profile(pool: &DatabasePool, email: &str) -> Result<bool, RepositoryError> {
        debug!("Deleting profile from database: email={}", email);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                let affected = conn.execute("DELETE FROM user_profiles WHERE email = ?", [email])?;
                Ok(affected > 0)
            }
        }
    }

    /// All profiles, sorted by email
    pub async fn list_profiles(pool: &DatabasePool) -> Result<Vec<StoredUserProfile>, RepositoryError> {
        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM user_profiles ORDER BY email", PROFILE_COLUMNS
                ))?;
                let rows = stmt.query_map([], map_profile)?;

                let mut result = Vec::new();
                for profile in rows {
                    result.push(profile?);
                }

                Ok(result)
            }
        }
    }
}

fn write_profile(conn: &rusqlite::Connection, profile: &StoredUserProfile) -> Result<(), RepositoryError> {
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO user_profiles ({}) VALUES
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            PROFILE_COLUMNS
        ),
        params![
            profile.email,
            profile.name,
            profile.lastname,
            profile.phone,
            profile.role,
            profile.blood_type,
            profile.emergency_contact,
            profile.gender,
            profile.chronic_disease,
            profile.allergy,
            profile.created_at,
            profile.updated_at,
        ],
    )?;
    Ok(())
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<StoredScreeningRecord> {
    Ok(StoredScreeningRecord {
        id: row.get(0)?,
        user_email: row.get(1)?,
        user_name: row.get(2)?,
        user_role: row.get(3)?,
        result: row.get(4)?,
        pregnancies: row.get(5)?,
        glucose: row.get(6)?,
        blood_pressure: row.get(7)?,
        skin_thickness: row.get(8)?,
        insulin: row.get(9)?,
        weight_kg: row.get(10)?,
        height_cm: row.get(11)?,
        bmi: row.get(12)?,
        diabetes_pedigree: row.get(13)?,
        age: row.get(14)?,
        probability: row.get(15)?,
        recorded_at: row.get(16)?,
    })
}

fn map_profile(row: &Row<'_>) -> rusqlite::Result<StoredUserProfile> {
    Ok(StoredUserProfile {
        email: row.get(0)?,
        name: row.get(1)?,
        lastname: row.get(2)?,
        phone: row.get(3)?,
        role: row.get(4)?,
        blood_type: row.get(5)?,
        emergency_contact: row.get(6)?,
        gender: row.get(7)?,
        chronic_disease: row.get(8)?,
        allergy: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}
