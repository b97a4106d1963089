use chrono::{DateTime, Utc};
use tracing::warn;

use gluco_screen_data::models::{NewScreeningRecord, ProfileChanges, StoredScreeningRecord, StoredUserProfile};

use crate::entities::screening::{ResultLabel, ScreeningRecord};
use crate::entities::user::{BloodType, Gender, ProfileUpdate, Role, UserProfile};

// Conversion functions between domain entities and data models.
// These follow the pattern convert_to_[target_layer]_[model_name].

/// Convert a stored record into a domain record.
///
/// Returns `None` (with a warning) for rows whose timestamp or label cannot be
/// read, so one malformed row never fails a whole query.
pub fn convert_to_domain_record(stored: StoredScreeningRecord) -> Option<ScreeningRecord> {
    let recorded_at = match stored.recorded_at.as_deref().map(DateTime::parse_from_rfc3339) {
        Some(Ok(ts)) => ts.with_timezone(&Utc),
        Some(Err(e)) => {
            warn!("Skipping screening record {} with unparsable timestamp: {}", stored.id, e);
            return None;
        }
        None => {
            warn!("Skipping screening record {} without timestamp", stored.id);
            return None;
        }
    };

    let result = match stored.result.parse::<ResultLabel>() {
        Ok(label) => label,
        Err(e) => {
            warn!("Skipping screening record {}: {}", stored.id, e);
            return None;
        }
    };

    Some(ScreeningRecord {
        id: stored.id,
        user_email: stored.user_email,
        user_name: stored.user_name,
        user_role: Role::from_stored(&stored.user_role),
        result,
        pregnancies: stored.pregnancies,
        glucose: stored.glucose,
        blood_pressure: stored.blood_pressure,
        skin_thickness: stored.skin_thickness,
        insulin: stored.insulin,
        weight_kg: stored.weight_kg,
        height_cm: stored.height_cm,
        bmi: stored.bmi,
        diabetes_pedigree: stored.diabetes_pedigree,
        age: stored.age,
        probability: stored.probability,
        recorded_at,
    })
}

/// Convert a batch of stored records, dropping unreadable rows and sorting ascending
pub fn convert_to_domain_records(stored: Vec<StoredScreeningRecord>) -> Vec<ScreeningRecord> {
    let mut records: Vec<ScreeningRecord> = stored
        .into_iter()
        .filter_map(convert_to_domain_record)
        .collect();
    records.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
    records
}

/// Convert a stored profile into a domain profile
pub fn convert_to_domain_profile(stored: StoredUserProfile) -> UserProfile {
    UserProfile {
        name: stored
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UserProfile::UNSPECIFIED_NAME.to_string()),
        role: Role::from_stored(&stored.role),
        blood_type: stored.blood_type.as_deref().and_then(BloodType::from_stored),
        gender: stored.gender.as_deref().and_then(Gender::from_stored),
        email: stored.email,
        lastname: stored.lastname,
        phone: stored.phone,
        emergency_contact: stored.emergency_contact,
        chronic_disease: stored.chronic_disease,
        allergy: stored.allergy,
        created_at: stored.created_at,
        updated_at: stored.updated_at,
    }
}

/// Convert a profile update into data-layer changes.
/// Medical fields are only carried when `include_medical` is set.
pub fn convert_to_data_profile_changes(update: &ProfileUpdate, include_medical: bool, updated_at: String) -> ProfileChanges {
    let mut changes = ProfileChanges {
        name: update.name.clone(),
        lastname: update.lastname.clone(),
        phone: update.phone.clone(),
        updated_at: Some(updated_at),
        ..Default::default()
    };

    if include_medical {
        changes.blood_type = update.blood_type.map(|b| b.as_str().to_string());
        changes.emergency_contact = update.emergency_contact.clone();
        changes.gender = update.gender.map(|g| g.as_str().to_string());
        changes.chronic_disease = update.chronic_disease.clone();
        changes.allergy = update.allergy.clone();
    }

    changes
}

/// Build the data-layer record for an assessed submission
pub fn convert_to_data_new_record(record: &ScreeningRecordDraft) -> NewScreeningRecord {
    NewScreeningRecord {
        user_email: record.user_email.clone(),
        user_name: record.user_name.clone(),
        user_role: record.user_role.as_str().to_string(),
        result: record.result.as_str().to_string(),
        pregnancies: record.pregnancies,
        glucose: record.glucose,
        blood_pressure: record.blood_pressure,
        skin_thickness: record.skin_thickness,
        insulin: record.insulin,
        weight_kg: record.weight_kg,
        height_cm: record.height_cm,
        bmi: record.bmi,
        diabetes_pedigree: record.diabetes_pedigree,
        age: record.age,
        probability: Some(record.probability),
    }
}

/// A record before the store assigns its id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningRecordDraft {
    pub user_email: String,
    pub user_name: String,
    pub user_role: Role,
    pub result: ResultLabel,
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
    pub probability: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use gluco_screen_data::repository::tests::sample_record;

    #[test]
    fn test_records_without_timestamp_are_dropped() {
        let good = sample_record("ana@example.com", 95)
            .into_stored("1".to_string(), "2024-05-01T08:00:00.000Z".to_string());
        let mut missing = good.clone();
        missing.id = "2".to_string();
        missing.recorded_at = None;
        let mut garbled = good.clone();
        garbled.id = "3".to_string();
        garbled.recorded_at = Some("not a date".to_string());

        let records = convert_to_domain_records(vec![missing, good, garbled]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "1");
        assert_eq!(records[0].result, ResultLabel::NoRisk);
    }

    #[test]
    fn test_profile_defaults_unspecified_name() {
        let profile = convert_to_domain_profile(StoredUserProfile::new("ana@example.com"));
        assert_eq!(profile.name, "unspecified");
        assert_eq!(profile.role, Role::User);
    }

    #[test]
    fn test_profile_changes_drop_medical_fields_for_admins() {
        let update = ProfileUpdate {
            name: Some("Root".to_string()),
            blood_type: Some(BloodType::O),
            allergy: Some("penicillin".to_string()),
            ..Default::default()
        };
        let changes = convert_to_data_profile_changes(&update, false, "now".to_string());
        assert_eq!(changes.name.as_deref(), Some("Root"));
        assert!(changes.blood_type.is_none());
        assert!(changes.allergy.is_none());

        let changes = convert_to_data_profile_changes(&update, true, "now".to_string());
        assert_eq!(changes.blood_type.as_deref(), Some("O"));
    }
}
