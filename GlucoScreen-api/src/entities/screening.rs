use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use gluco_screen_domain::entities::{FamilyHistory, ScreeningInput, SymptomFlags};

/// Questionnaire payload.
///
/// Upper bounds catch typos; missing or non-positive measurements are
/// reported by the screening service itself.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PublicScreeningRequest {
    #[validate(range(max = 30, message = "Pregnancies must be at most 30"))]
    #[serde(default)]
    pub pregnancies: i32,

    /// Fasting plasma glucose, mg/dL
    #[validate(range(max = 1000, message = "Glucose must be at most 1000 mg/dL"))]
    pub glucose: i32,

    /// Diastolic blood pressure, mmHg
    #[validate(range(max = 300, message = "Blood pressure must be at most 300 mmHg"))]
    pub blood_pressure: i32,

    #[validate(range(max = 2000, message = "Insulin must be at most 2000"))]
    #[serde(default)]
    pub insulin: i32,

    #[validate(range(max = 500.0, message = "Weight must be at most 500 kg"))]
    pub weight_kg: f64,

    #[validate(range(max = 300.0, message = "Height must be at most 300 cm"))]
    pub height_cm: f64,

    #[validate(range(max = 130, message = "Age must be at most 130"))]
    pub age: i32,

    #[serde(default)]
    pub family_history: FamilyHistory,

    #[serde(default)]
    pub symptoms: SymptomFlags,
}

impl From<PublicScreeningRequest> for ScreeningInput {
    fn from(request: PublicScreeningRequest) -> Self {
        ScreeningInput {
            pregnancies: request.pregnancies,
            glucose: request.glucose,
            blood_pressure: request.blood_pressure,
            insulin: request.insulin,
            weight_kg: request.weight_kg,
            height_cm: request.height_cm,
            age: request.age,
            family_history: request.family_history,
            symptoms: request.symptoms,
        }
    }
}

/// Date bounds for history queries: RFC 3339 timestamps or `YYYY-MM-DD` dates
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct HistoryQueryParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
