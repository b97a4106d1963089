// Domain entities and value objects
pub mod admin;
pub mod conversions;
pub mod screening;
pub mod user;

// Re-export common types for easier imports
pub use admin::{DailyGlucose, DashboardStats, PatientDetail, PatientResultRow, ResultFilter, UserSummary};
pub use screening::{
    BmiCategory, DateRange, FamilyHistory, FeatureVector, HistorySummary, NormalizedInput,
    Recommendation, RecommendationKind, ResultLabel, RiskAssessment, RiskStatus, ScreeningInput,
    ScreeningOutcome, ScreeningRecord, ScreeningReport, Submitter, SymptomFlags, TrendPoint,
    FEATURE_COUNT, FEATURE_NAMES, SKIN_THICKNESS_PROXY,
};
pub use user::{BloodType, Gender, ProfileUpdate, Role, UserProfile};
