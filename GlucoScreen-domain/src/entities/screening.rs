use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::user::Role;
use crate::errors::ScreeningError;

/// Number of classifier features
pub const FEATURE_COUNT: usize = 8;

/// Feature order expected by the classifier
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "pregnancies",
    "glucose",
    "blood_pressure",
    "skin_thickness",
    "insulin",
    "bmi",
    "diabetes_pedigree",
    "age",
];

/// Skin thickness is not collected; the model was trained with this stand-in
pub const SKIN_THICKNESS_PROXY: f64 = 20.0;

/// Number of first-degree relatives with diabetes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FamilyHistory {
    #[default]
    None,
    OneRelative,
    MultipleRelatives,
}

impl FamilyHistory {
    /// Numeric pedigree proxy fed to the classifier
    pub fn pedigree_score(&self) -> f64 {
        match self {
            FamilyHistory::None => 0.2,
            FamilyHistory::OneRelative => 0.5,
            FamilyHistory::MultipleRelatives => 0.8,
        }
    }
}

/// Self-reported symptom and lifestyle indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct SymptomFlags {
    #[serde(default)]
    pub frequent_sugary_drinks: bool,
    #[serde(default)]
    pub nocturia: bool,
    #[serde(default)]
    pub slow_wound_healing: bool,
    #[serde(default)]
    pub direct_family_history: bool,
}

impl SymptomFlags {
    /// Count of flags that are set (0..=4)
    pub fn behavior_score(&self) -> u8 {
        [
            self.frequent_sugary_drinks,
            self.nocturia,
            self.slow_wound_healing,
            self.direct_family_history,
        ]
        .iter()
        .filter(|flag| **flag)
        .count() as u8
    }
}

/// One questionnaire submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScreeningInput {
    pub pregnancies: i32,
    /// Fasting plasma glucose, mg/dL
    pub glucose: i32,
    /// Diastolic blood pressure, mmHg
    pub blood_pressure: i32,
    pub insulin: i32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: i32,
    #[serde(default)]
    pub family_history: FamilyHistory,
    #[serde(default)]
    pub symptoms: SymptomFlags,
}

/// Fixed-order numeric input of the classifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Value of the named feature, if the name is known
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES.iter().position(|n| *n == name).map(|i| self.0[i])
    }
}

/// Output of the feature normalizer
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInput {
    pub features: FeatureVector,
    pub bmi: f64,
    pub pedigree_score: f64,
    pub glucose: i32,
    pub behavior_score: u8,
    pub symptoms: SymptomFlags,
}

/// Tri-level screening status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    Normal,
    Watch,
    HighRisk,
}

impl RiskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Normal => "normal",
            RiskStatus::Watch => "watch",
            RiskStatus::HighRisk => "high_risk",
        }
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskStatus {
    type Err = ScreeningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(RiskStatus::Normal),
            "watch" => Ok(RiskStatus::Watch),
            "high_risk" | "high-risk" | "highrisk" => Ok(RiskStatus::HighRisk),
            other => Err(ScreeningError::ValidationError(format!(
                "Unknown status '{}', expected normal, watch or high_risk", other
            ))),
        }
    }
}

/// Coarse two-valued label persisted with each record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ResultLabel {
    #[serde(rename = "risk")]
    Risk,
    #[serde(rename = "no-risk")]
    NoRisk,
}

impl ResultLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultLabel::Risk => "risk",
            ResultLabel::NoRisk => "no-risk",
        }
    }
}

impl fmt::Display for ResultLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultLabel {
    type Err = ScreeningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "risk" => Ok(ResultLabel::Risk),
            "no-risk" => Ok(ResultLabel::NoRisk),
            other => Err(ScreeningError::PersistenceError(format!("Unknown result label '{}'", other))),
        }
    }
}

/// BMI band (Asian cut-offs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    SymptomWarning,
    WeightGuidance,
    DietaryNote,
    FollowUp,
}

/// One line of user-facing advice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub message: String,
}

/// Result of the risk policy for one input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RiskAssessment {
    /// Raw classifier label (0 or 1)
    pub label: u8,
    /// Probability of the positive class
    pub probability: f64,
    pub is_risk: bool,
    pub status: RiskStatus,
    pub result_label: ResultLabel,
    pub recommendations: Vec<Recommendation>,
}

/// Everything shown to the user after an assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScreeningOutcome {
    #[serde(flatten)]
    pub assessment: RiskAssessment,
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    pub pedigree_score: f64,
    pub behavior_score: u8,
}

/// A persisted screening
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScreeningRecord {
    pub id: String,
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
    pub probability: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

/// Identity attached to a submitted screening
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitter {
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Result of a submit: the outcome is always present, the record only when saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScreeningReport {
    pub outcome: ScreeningOutcome,
    pub saved: bool,
    pub record: Option<ScreeningRecord>,
    pub persistence_error: Option<String>,
}

/// Inclusive time range for history queries; either bound may be open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Build a range, rejecting `start > end`
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<Self, ScreeningError> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(ScreeningError::ValidationError(
                    "Start date must not be after end date".to_string(),
                ));
            }
        }
        Ok(Self { start, end })
    }

    /// The unbounded range
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse query bounds given as RFC 3339 timestamps or `YYYY-MM-DD` dates.
    /// A date end bound covers the whole day.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, ScreeningError> {
        let start = start
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_bound(s, false))
            .transpose()?;
        let end = end
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_bound(s, true))
            .transpose()?;
        Self::new(start, end)
    }

    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| *at >= s) && self.end.map_or(true, |e| *at <= e)
    }

    /// Bounds in the storage timestamp format
    pub fn storage_bounds(&self) -> (Option<String>, Option<String>) {
        let fmt = |dt: DateTime<Utc>| dt.to_rfc3339_opts(SecondsFormat::Millis, true);
        (self.start.map(fmt), self.end.map(fmt))
    }
}

fn parse_bound(value: &str, end_of_day: bool) -> Result<DateTime<Utc>, ScreeningError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ScreeningError::ValidationError(format!(
            "Invalid date '{}', expected YYYY-MM-DD or an RFC 3339 timestamp", value
        ))
    })?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    };
    let time = time.ok_or_else(|| ScreeningError::ValidationError(format!("Invalid date '{}'", value)))?;
    Ok(date.and_time(time).and_utc())
}

/// One point of a trend chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrendPoint {
    pub recorded_at: DateTime<Utc>,
    pub value: f64,
}

/// Aggregates over a user's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistorySummary {
    pub count: usize,
    pub risk_count: usize,
    pub no_risk_count: usize,
    pub glucose_trend: Vec<TrendPoint>,
    pub bmi_trend: Vec<TrendPoint>,
    pub latest_bmi_category: Option<BmiCategory>,
}
