use serde::{Deserialize, Serialize};

/// Storage model for one persisted screening.
///
/// Rows are append-only. `recorded_at` is nullable in the schema so that rows
/// imported from older stores can exist; queries never return them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredScreeningRecord {
    /// Unique identifier (UUID v4)
    pub id: String,

    /// Email of the submitting user
    pub user_email: String,

    /// Display name of the submitting user at submission time
    pub user_name: String,

    /// Role of the submitting user at submission time
    pub user_role: String,

    /// Coarse label, `risk` or `no-risk`
    pub result: String,

    pub pregnancies: i32,
    pub glucose: i32,
    pub blood_pressure: i32,
    pub skin_thickness: f64,
    pub insulin: i32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub bmi: f64,
    pub diabetes_pedigree: f64,
    pub age: i32,

    /// Probability of the positive class reported by the classifier
    pub probability: Option<f64>,

    /// RFC 3339 UTC timestamp with millisecond precision
    pub recorded_at: Option<String>,
}

/// Input for appending a screening record. The store assigns `id` and
/// `recorded_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewScreeningRecord {
    pub user_email: String,
    pub user_name: String,
    pub user_role: String,
    pub result: String,
    pub pregnancies: i32,
    pub glucose: i32,
    pub blood_pressure: i32,
    pub skin_thickness: f64,
    pub insulin: i32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub bmi: f64,
    pub diabetes_pedigree: f64,
    pub age: i32,
    pub probability: Option<f64>,
}

impl NewScreeningRecord {
    /// Attach the store-assigned identifier and timestamp
    pub fn into_stored(self, id: String, recorded_at: String) -> StoredScreeningRecord {
        StoredScreeningRecord {
            id,
            user_email: self.user_email,
            user_name: self.user_name,
            user_role: self.user_role,
            result: self.result,
            pregnancies: self.pregnancies,
            glucose: self.glucose,
            blood_pressure: self.blood_pressure,
            skin_thickness: self.skin_thickness,
            insulin: self.insulin,
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            bmi: self.bmi,
            diabetes_pedigree: self.diabetes_pedigree,
            age: self.age,
            probability: self.probability,
            recorded_at: Some(recorded_at),
        }
    }
}
