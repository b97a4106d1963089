//! CSV export of result overviews

use chrono::SecondsFormat;
use serde::Serialize;
use tracing::{debug, error};

use crate::entities::admin::PatientResultRow;
use crate::errors::ScreeningError;

/// UTF-8 byte order mark, so spreadsheet tools detect the encoding
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One CSV line; field order is the column order, values as stored
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    status: &'a str,
    patient_name: &'a str,
    result: &'a str,
    glucose: i32,
    bmi: f64,
    recorded_at: String,
    user: &'a str,
    name: &'a str,
    role: &'a str,
    pregnancies: i32,
    blood_pressure: i32,
    skin_thickness: f64,
    insulin: i32,
    weight_kg: f64,
    height_cm: f64,
    diabetes_pedigree: f64,
    age: i32,
    probability: Option<f64>,
    id: &'a str,
}

impl<'a> From<&'a PatientResultRow> for ExportRow<'a> {
    fn from(row: &'a PatientResultRow) -> Self {
        let r = &row.record;
        Self {
            status: row.status.as_str(),
            patient_name: &row.patient_name,
            result: r.result.as_str(),
            glucose: r.glucose,
            bmi: r.bmi,
            recorded_at: r.recorded_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            user: &r.user_email,
            name: &r.user_name,
            role: r.user_role.as_str(),
            pregnancies: r.pregnancies,
            blood_pressure: r.blood_pressure,
            skin_thickness: r.skin_thickness,
            insulin: r.insulin,
            weight_kg: r.weight_kg,
            height_cm: r.height_cm,
            diabetes_pedigree: r.diabetes_pedigree,
            age: r.age,
            probability: r.probability,
            id: &r.id,
        }
    }
}

/// Serialize rows as a BOM-prefixed CSV document with a header line
pub fn export_results_csv(rows: &[PatientResultRow]) -> Result<Vec<u8>, ScreeningError> {
    let mut wtr = csv::Writer::from_writer(UTF8_BOM.to_vec());

    for row in rows {
        wtr.serialize(ExportRow::from(row)).map_err(export_error)?;
    }

    // An empty export still carries the header
    if rows.is_empty() {
        wtr.write_record(COLUMNS).map_err(export_error)?;
    }

    let bytes = wtr.into_inner().map_err(|e| export_error(e.into_error()))?;
    debug!("Exported {} rows ({} bytes)", rows.len(), bytes.len());
    Ok(bytes)
}

/// Column names in file order
pub const COLUMNS: [&str; 19] = [
    "status",
    "patient_name",
    "result",
    "glucose",
    "bmi",
    "recorded_at",
    "user",
    "name",
    "role",
    "pregnancies",
    "blood_pressure",
    "skin_thickness",
    "insulin",
    "weight_kg",
    "height_cm",
    "diabetes_pedigree",
    "age",
    "probability",
    "id",
];

fn export_error<E: std::fmt::Display>(e: E) -> ScreeningError {
    error!("CSV export failed: {}", e);
    ScreeningError::PersistenceError(format!("CSV export failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::screening::{ResultLabel, RiskStatus, ScreeningRecord};
    use crate::entities::user::Role;
    use chrono::{TimeZone, Utc};

    fn row(name: &str) -> PatientResultRow {
        PatientResultRow {
            status: RiskStatus::HighRisk,
            patient_name: name.to_string(),
            record: ScreeningRecord {
                id: "rec-1".to_string(),
                user_email: "ana@example.com".to_string(),
                user_name: name.to_string(),
                user_role: Role::User,
                result: ResultLabel::Risk,
                pregnancies: 1,
                glucose: 140,
                blood_pressure: 85,
                skin_thickness: 20.0,
                insulin: 0,
                weight_kg: 80.0,
                height_cm: 170.0,
                bmi: 27.681,
                diabetes_pedigree: 0.5,
                age: 45,
                probability: Some(0.75),
                recorded_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
            },
        }
    }

    #[test]
    fn test_export_starts_with_bom_and_header() {
        let bytes = export_results_csv(&[row("Ana")]).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), COLUMNS.join(","));
        assert_eq!(
            lines.next().unwrap(),
            "high_risk,Ana,risk,140,27.681,2024-05-01T08:00:00Z,ana@example.com,Ana,user,1,85,20.0,0,80.0,170.0,0.5,45,0.75,rec-1"
        );
    }

    #[test]
    fn test_export_keeps_non_ascii_names() {
        let bytes = export_results_csv(&[row("สมชาย")]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("สมชาย"));
    }

    #[test]
    fn test_empty_export_has_header_only() {
        let bytes = export_results_csv(&[]).unwrap();
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text.trim_end(), COLUMNS.join(","));
    }
}
