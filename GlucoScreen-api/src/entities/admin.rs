use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use gluco_screen_domain::entities::{ResultFilter, RiskStatus, Role};
use gluco_screen_domain::errors::ScreeningError;

/// Role change payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicRoleChangeRequest {
    pub role: Role,
}

/// Password reset payload
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct PublicPasswordResetRequest {
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

/// Filters of the results overview and CSV export
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ResultsQueryParams {
    /// Case-insensitive match on patient name or email
    pub search: Option<String>,
    /// `normal`, `watch` or `high_risk`; empty or `all` means no filter
    pub status: Option<String>,
}

impl ResultsQueryParams {
    pub fn to_filter(&self) -> Result<ResultFilter, ScreeningError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(value) => Some(value.parse::<RiskStatus>()?),
        };
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(ResultFilter { search, status })
    }

    /// `report_<status>.csv`, or `report_all.csv` without a status filter
    pub fn export_file_name(filter: &ResultFilter) -> String {
        let status = filter.status.map(|s| s.as_str()).unwrap_or("all");
        format!("report_{}.csv", status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_parsing() {
        let params = ResultsQueryParams { search: Some("  ana ".into()), status: Some("high_risk".into()) };
        let filter = params.to_filter().unwrap();
        assert_eq!(filter.search.as_deref(), Some("ana"));
        assert_eq!(filter.status, Some(RiskStatus::HighRisk));
        assert_eq!(ResultsQueryParams::export_file_name(&filter), "report_high_risk.csv");

        let all = ResultsQueryParams { search: None, status: Some("all".into()) }.to_filter().unwrap();
        assert_eq!(all, ResultFilter::default());
        assert_eq!(ResultsQueryParams::export_file_name(&all), "report_all.csv");

        let bad = ResultsQueryParams { search: None, status: Some("purple".into()) };
        assert!(bad.to_filter().is_err());
    }
}
