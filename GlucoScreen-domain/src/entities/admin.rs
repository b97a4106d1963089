use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::screening::{RiskStatus, ScreeningRecord};
use crate::entities::user::{Role, UserProfile};

/// One row of the admin user list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub email: String,
    pub name: String,
    pub role: Role,
    /// False when the identity is only known from its results
    pub has_profile: bool,
}

impl UserSummary {
    /// Label for identities that submitted results but never saved a profile
    pub const NO_PROFILE_NAME: &'static str = "new user (no profile)";
}

/// Filter for the results overview and export
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultFilter {
    /// Case-insensitive match on patient name or email
    pub search: Option<String>,
    pub status: Option<RiskStatus>,
}

/// A record with its derived status and the patient's full name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientResultRow {
    pub status: RiskStatus,
    pub patient_name: String,
    pub record: ScreeningRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientDetail {
    pub profile: UserProfile,
    /// Newest first
    pub recent_records: Vec<ScreeningRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailyGlucose {
    pub day: NaiveDate,
    pub mean_glucose: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub total_users: usize,
    pub total_predictions: usize,
    pub risk_count: usize,
    /// Ascending by day
    pub daily_mean_glucose: Vec<DailyGlucose>,
}
